//! Datagram dispatch.
//!
//! [`DataDispatcher`] decodes each VITA-49 datagram and hands it to the
//! object that owns its stream id: meter readings update meter values,
//! panadapter and waterfall segments go to their reassemblers, and audio
//! and IQ packets go to the matching stream object. Datagrams for unknown
//! streams are dropped at trace level.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use flexlib_core::StreamId;

use crate::model::Model;
use crate::vita49::{self, StreamPacket, StreamType};

/// Largest datagram the radio sends, with headroom.
const MAX_DATAGRAM: usize = 8192;

/// Routes decoded datagrams into the object store.
#[derive(Debug)]
pub struct DataDispatcher {
    model: Arc<Model>,
    packets: AtomicU64,
    unroutable: AtomicU64,
}

impl DataDispatcher {
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            packets: AtomicU64::new(0),
            unroutable: AtomicU64::new(0),
        }
    }

    /// Datagrams decoded so far.
    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::Relaxed)
    }

    /// Datagrams that decoded but matched no known stream.
    pub fn unroutable(&self) -> u64 {
        self.unroutable.load(Ordering::Relaxed)
    }

    /// Decode and route one datagram. Returns whether an object took it.
    pub fn dispatch(&self, datagram: &[u8]) -> bool {
        match vita49::parse_packet(datagram) {
            Ok(packet) => self.dispatch_packet(&packet),
            Err(e) => {
                tracing::trace!(error = %e, len = datagram.len(), "Dropping undecodable datagram");
                false
            }
        }
    }

    /// Route an already decoded packet.
    pub fn dispatch_packet(&self, packet: &StreamPacket<'_>) -> bool {
        self.packets.fetch_add(1, Ordering::Relaxed);
        let id = packet.stream_id;

        let routed = match packet.stream_type() {
            StreamType::Meter => self.meters(packet),
            StreamType::Panadapter => self.model.panadapters.write(|p| {
                p.get_mut(&id).map(|pan| pan.push_segment(packet.payload)).is_some()
            }),
            StreamType::Waterfall => self.model.waterfalls.write(|w| {
                w.get_mut(&id).map(|wf| wf.push_segment(packet.payload)).is_some()
            }),
            StreamType::DaxAudio | StreamType::DaxReducedBandwidth => self.audio(id, packet),
            StreamType::DaxIq(_) => self
                .model
                .dax_iq_streams
                .write(|s| s.get_mut(&id).map(|iq| iq.process(packet)).is_some()),
            StreamType::Opus => self
                .model
                .remote_rx_streams
                .write(|s| s.get_mut(&id).map(|rx| rx.process(packet)).is_some()),
            StreamType::Discovery => {
                tracing::trace!("Ignoring discovery datagram on the data port");
                return false;
            }
            StreamType::Unknown(code) => {
                tracing::trace!(
                    stream_id = format!("0x{:08X}", id.raw()),
                    class_code = format!("0x{code:04X}"),
                    "Unknown packet class"
                );
                false
            }
        };

        if !routed {
            self.unroutable.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                stream_id = format!("0x{:08X}", id.raw()),
                "No object for stream"
            );
        }
        routed
    }

    fn meters(&self, packet: &StreamPacket<'_>) -> bool {
        let readings = match vita49::parse_meter_payload(packet.payload) {
            Ok(r) => r,
            Err(e) => {
                tracing::trace!(error = %e, "Bad meter payload");
                return false;
            }
        };
        self.model.meters.write(|meters| {
            for reading in &readings {
                if let Some(meter) = meters.get_mut(&reading.meter_id) {
                    meter.set_raw_value(reading.value);
                }
            }
        });
        true
    }

    /// DAX audio ids may belong to a receive, microphone or uncompressed
    /// remote-audio stream.
    fn audio(&self, id: StreamId, packet: &StreamPacket<'_>) -> bool {
        self.model
            .dax_rx_streams
            .write(|s| s.get_mut(&id).map(|rx| rx.process(packet)).is_some())
            || self
                .model
                .dax_mic_streams
                .write(|s| s.get_mut(&id).map(|mic| mic.process(packet)).is_some())
            || self
                .model
                .remote_rx_streams
                .write(|s| s.get_mut(&id).map(|rx| rx.process(packet)).is_some())
    }

    /// Drain `socket` until cancelled. Receive errors are not fatal.
    pub async fn run(&self, socket: UdpSocket, cancel: CancellationToken) {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Datagram loop stopped");
                    return;
                }
                received = socket.recv(&mut buf) => match received {
                    Ok(n) => {
                        self.dispatch(&buf[..n]);
                    }
                    Err(e) => tracing::trace!(error = %e, "UDP recv error"),
                },
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::route_line;
    use crate::stream::{AudioFrame, PanadapterFrame};
    use crate::vita49::{class, encode_packet};
    use tokio::sync::mpsc;

    fn model_with(lines: &[&str]) -> Arc<Model> {
        let model = Arc::new(Model::default());
        for line in lines {
            route_line(&model, line);
        }
        model
    }

    #[test]
    fn meter_values_are_scaled() {
        let model = model_with(&["S0|meter 7.src=SLC#7.num=0#7.nam=LEVEL#7.unit=dBm#"]);
        let dispatcher = DataDispatcher::new(Arc::clone(&model));

        let mut payload = Vec::new();
        payload.extend_from_slice(&7u16.to_be_bytes());
        payload.extend_from_slice(&(-(73i16 * 128)).to_be_bytes());
        payload.extend_from_slice(&99u16.to_be_bytes());
        payload.extend_from_slice(&1i16.to_be_bytes());
        let datagram = encode_packet(StreamId::new(0x0000_0700), class::METER, 0, &payload).unwrap();

        assert!(dispatcher.dispatch(&datagram));
        let value = model.meters.read(|m| m.get(&7).map(|x| x.value));
        assert_eq!(value, Some(-73.0));
    }

    #[test]
    fn panadapter_segments_reach_delegate() {
        let model = model_with(&["S0|display pan 0x40000000 center=14.1 bandwidth=0.2"]);
        let dispatcher = DataDispatcher::new(Arc::clone(&model));
        let (tx, mut rx) = mpsc::channel::<PanadapterFrame>(4);
        model.panadapters.write(|p| {
            p.get_mut(&StreamId::new(0x4000_0000))
                .unwrap()
                .delegate
                .set(Box::new(tx))
        });

        let mut segment = Vec::new();
        for v in [0u16, 2, 2, 2] {
            segment.extend_from_slice(&v.to_be_bytes());
        }
        segment.extend_from_slice(&1u32.to_be_bytes());
        segment.extend_from_slice(&10u16.to_be_bytes());
        segment.extend_from_slice(&20u16.to_be_bytes());
        let datagram = encode_packet(StreamId::new(0x4000_0000), class::PANADAPTER, 0, &segment).unwrap();

        assert!(dispatcher.dispatch(&datagram));
        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.frame_number, 1);
        assert_eq!(frame.bins, vec![10, 20]);
        assert!(
            model
                .panadapters
                .read(|p| p.get(&StreamId::new(0x4000_0000)).unwrap().is_streaming)
        );
    }

    #[test]
    fn dax_audio_routes_to_stream() {
        let model = model_with(&[
            "H00000001",
            "S1|stream 0x04000008 type=dax_rx dax_channel=1 client_handle=0x00000001",
        ]);
        let dispatcher = DataDispatcher::new(Arc::clone(&model));
        let (tx, mut rx) = mpsc::channel::<AudioFrame>(4);
        model.dax_rx_streams.write(|s| {
            s.get_mut(&StreamId::new(0x0400_0008))
                .unwrap()
                .delegate
                .set(Box::new(tx))
        });

        let mut payload = Vec::new();
        for v in [0.5f32, -0.5, 0.25, -0.25] {
            payload.extend_from_slice(&v.to_be_bytes());
        }
        let datagram = encode_packet(StreamId::new(0x0400_0008), class::DAX_AUDIO, 0, &payload).unwrap();
        assert!(dispatcher.dispatch(&datagram));

        let frame = rx.try_recv().unwrap();
        assert_eq!(frame.samples, vec![0.5, -0.5, 0.25, -0.25]);
        assert_eq!(frame.frame_count(), 2);
    }

    #[test]
    fn unknown_stream_and_garbage() {
        let model = Arc::new(Model::default());
        let dispatcher = DataDispatcher::new(model);

        let datagram = encode_packet(StreamId::new(0x0400_0001), class::DAX_AUDIO, 0, &[0; 8]).unwrap();
        assert!(!dispatcher.dispatch(&datagram));
        assert!(!dispatcher.dispatch(&[1, 2, 3]));
        assert_eq!(dispatcher.packets(), 1);
        assert_eq!(dispatcher.unroutable(), 1);
    }

    #[tokio::test]
    async fn run_drains_socket_until_cancelled() {
        let model = model_with(&["S0|meter 3.src=RAD#3.num=0#3.nam=PATEMP#3.unit=degC#"]);
        let dispatcher = Arc::new(DataDispatcher::new(Arc::clone(&model)));

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let task = {
            let dispatcher = Arc::clone(&dispatcher);
            let cancel = cancel.clone();
            tokio::spawn(async move { dispatcher.run(socket, cancel).await })
        };

        let mut payload = Vec::new();
        payload.extend_from_slice(&3u16.to_be_bytes());
        payload.extend_from_slice(&(40i16 * 64).to_be_bytes());
        let datagram = encode_packet(StreamId::new(0x0000_0700), class::METER, 0, &payload).unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        sender.send_to(&datagram, addr).await.unwrap();

        let read = || model.meters.read(|m| m.get(&3).map(|x| x.value));
        for _ in 0..100 {
            if read() == Some(40.0) {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(read(), Some(40.0));

        cancel.cancel();
        task.await.unwrap();
    }
}
