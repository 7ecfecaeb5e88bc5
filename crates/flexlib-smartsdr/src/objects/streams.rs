//! DAX and remote audio streams.
//!
//! All six kinds share the `stream <hex id> type=<kind> ...` status form,
//! are initialized once the owning client handle is known, and carry a
//! fresh sequence tracker from construction. Receive kinds decode each
//! accepted packet into a frame for their delegate; transmit kinds stamp
//! outgoing packets with their own sequence counter.

use bytes::Bytes;

use flexlib_core::{ClientHandle, Error, ObjectKind, Result, StreamId};

use crate::object::RadioObject;
use crate::stream::sequence::SequenceTracker;
use crate::stream::{
    AudioFrame, DAX_CHANNELS, DAX_SAMPLE_RATE, DelegateSlot, IqFrame, RemoteAudioFrame,
    RemoteAudioPayload, TxSequence, accept_sequence, decode_float32, decode_int16_mono,
};
use crate::vita49::{self, StreamPacket, StreamType, class};

/// Generate the [`RadioObject`] impl shared by every stream kind.
macro_rules! stream_object {
    ($ty:ident, $kind:expr) => {
        impl RadioObject for $ty {
            type Id = StreamId;
            const KIND: ObjectKind = $kind;

            fn with_id(id: StreamId) -> Self {
                $ty {
                    id,
                    ..$ty::default()
                }
            }

            fn id(&self) -> &StreamId {
                &self.id
            }
        }

        crate::lifecycle!($ty, |s| !s.client_handle.is_none());
    };
}

/// Decode a DAX audio payload according to its class code.
fn decode_dax_audio(packet: &StreamPacket<'_>) -> Vec<f32> {
    match packet.stream_type() {
        StreamType::DaxReducedBandwidth => decode_int16_mono(packet.payload),
        _ => decode_float32(packet.payload),
    }
}

// ---------------------------------------------------------------------------
// DAX receive audio
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DaxRxAudioStream {
    pub id: StreamId,
    pub initialized: bool,
    pub is_streaming: bool,

    pub stream_type: String,
    pub client_handle: ClientHandle,
    /// DAX channel (1-8).
    pub dax_channel: u8,
    pub slice: i32,
    pub dax_clients: u32,
    pub ip: String,

    pub tracker: SequenceTracker,
    pub delegate: DelegateSlot<AudioFrame>,
}

crate::property_table!(DaxRxAudioStream {
    "type" => stream_type,
    "client_handle" => client_handle,
    "dax_channel" => dax_channel,
    "slice" => slice,
    "dax_clients" => dax_clients,
    "ip" => ip,
});

stream_object!(DaxRxAudioStream, ObjectKind::DaxRxAudioStream);

impl DaxRxAudioStream {
    /// Process one packet. Returns `false` if it was dropped as late.
    pub fn process(&mut self, packet: &StreamPacket<'_>) -> bool {
        self.is_streaming = true;
        if !accept_sequence(&mut self.tracker, packet.sequence, self.id) {
            return false;
        }
        let frame = AudioFrame {
            sequence: packet.sequence,
            sample_rate: DAX_SAMPLE_RATE,
            channels: DAX_CHANNELS,
            samples: decode_dax_audio(packet),
        };
        self.delegate.deliver(&frame);
        true
    }
}

// ---------------------------------------------------------------------------
// DAX microphone audio
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DaxMicAudioStream {
    pub id: StreamId,
    pub initialized: bool,
    pub is_streaming: bool,

    pub stream_type: String,
    pub client_handle: ClientHandle,
    pub ip: String,

    pub tracker: SequenceTracker,
    pub delegate: DelegateSlot<AudioFrame>,
}

crate::property_table!(DaxMicAudioStream {
    "type" => stream_type,
    "client_handle" => client_handle,
    "ip" => ip,
});

stream_object!(DaxMicAudioStream, ObjectKind::DaxMicAudioStream);

impl DaxMicAudioStream {
    pub fn process(&mut self, packet: &StreamPacket<'_>) -> bool {
        self.is_streaming = true;
        if !accept_sequence(&mut self.tracker, packet.sequence, self.id) {
            return false;
        }
        let frame = AudioFrame {
            sequence: packet.sequence,
            sample_rate: DAX_SAMPLE_RATE,
            channels: DAX_CHANNELS,
            samples: decode_dax_audio(packet),
        };
        self.delegate.deliver(&frame);
        true
    }
}

// ---------------------------------------------------------------------------
// DAX IQ
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DaxIqStream {
    pub id: StreamId,
    pub initialized: bool,
    pub is_streaming: bool,

    pub stream_type: String,
    pub client_handle: ClientHandle,
    pub daxiq_channel: u8,
    pub panadapter: StreamId,
    /// Sample rate requested for the stream, in Hz.
    pub rate: u32,
    pub active: bool,
    pub ip: String,

    pub tracker: SequenceTracker,
    pub delegate: DelegateSlot<IqFrame>,
}

crate::property_table!(DaxIqStream {
    "type" => stream_type,
    "client_handle" => client_handle,
    "daxiq_channel" => daxiq_channel,
    "pan" => panadapter,
    "daxiq_rate" => rate,
    "active" => active,
    "ip" => ip,
});

stream_object!(DaxIqStream, ObjectKind::DaxIqStream);

impl DaxIqStream {
    pub fn process(&mut self, packet: &StreamPacket<'_>) -> bool {
        self.is_streaming = true;
        if !accept_sequence(&mut self.tracker, packet.sequence, self.id) {
            return false;
        }
        let sample_rate = match packet.stream_type() {
            StreamType::DaxIq(rate) => rate,
            _ => self.rate,
        };
        let frame = IqFrame {
            sequence: packet.sequence,
            sample_rate,
            samples: decode_float32(packet.payload),
        };
        self.delegate.deliver(&frame);
        true
    }
}

// ---------------------------------------------------------------------------
// Remote receive audio
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RemoteRxAudioStream {
    pub id: StreamId,
    pub initialized: bool,
    pub is_streaming: bool,

    pub stream_type: String,
    pub client_handle: ClientHandle,
    /// `OPUS` or `NONE`.
    pub compression: String,
    pub ip: String,

    pub tracker: SequenceTracker,
    pub delegate: DelegateSlot<RemoteAudioFrame>,
}

crate::property_table!(RemoteRxAudioStream {
    "type" => stream_type,
    "client_handle" => client_handle,
    "compression" => compression,
    "ip" => ip,
});

stream_object!(RemoteRxAudioStream, ObjectKind::RemoteRxAudioStream);

impl RemoteRxAudioStream {
    pub fn process(&mut self, packet: &StreamPacket<'_>) -> bool {
        self.is_streaming = true;
        if !accept_sequence(&mut self.tracker, packet.sequence, self.id) {
            return false;
        }
        let payload = match packet.stream_type() {
            StreamType::Opus => RemoteAudioPayload::Opus(Bytes::copy_from_slice(packet.payload)),
            _ => RemoteAudioPayload::Pcm(decode_dax_audio(packet)),
        };
        self.delegate.deliver(&RemoteAudioFrame {
            sequence: packet.sequence,
            payload,
        });
        true
    }
}

// ---------------------------------------------------------------------------
// Transmit streams
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DaxTxAudioStream {
    pub id: StreamId,
    pub initialized: bool,
    pub is_streaming: bool,

    pub stream_type: String,
    pub client_handle: ClientHandle,
    /// Whether this stream is the radio's active transmit source.
    pub tx: bool,
    pub ip: String,

    pub tx_sequence: TxSequence,
}

crate::property_table!(DaxTxAudioStream {
    "type" => stream_type,
    "client_handle" => client_handle,
    "tx" => tx,
    "ip" => ip,
});

stream_object!(DaxTxAudioStream, ObjectKind::DaxTxAudioStream);

impl DaxTxAudioStream {
    /// Encode interleaved L/R samples as one outbound packet.
    pub fn encode_samples(&mut self, samples: &[f32]) -> Result<Bytes> {
        let payload: Vec<u8> = samples.iter().flat_map(|s| s.to_be_bytes()).collect();
        if payload.len() > vita49::MAX_PAYLOAD_SIZE {
            return Err(Error::InvalidParameter(format!(
                "{} samples do not fit one packet",
                samples.len()
            )));
        }
        self.is_streaming = true;
        vita49::encode_packet(
            self.id,
            class::DAX_AUDIO,
            self.tx_sequence.next_sequence(),
            &payload,
        )
    }
}

#[derive(Debug, Default)]
pub struct RemoteTxAudioStream {
    pub id: StreamId,
    pub initialized: bool,
    pub is_streaming: bool,

    pub stream_type: String,
    pub client_handle: ClientHandle,
    pub compression: String,
    pub ip: String,

    pub tx_sequence: TxSequence,
}

crate::property_table!(RemoteTxAudioStream {
    "type" => stream_type,
    "client_handle" => client_handle,
    "compression" => compression,
    "ip" => ip,
});

stream_object!(RemoteTxAudioStream, ObjectKind::RemoteTxAudioStream);

impl RemoteTxAudioStream {
    /// Wrap one already-encoded Opus frame as an outbound packet.
    pub fn encode_opus(&mut self, opus: &[u8]) -> Result<Bytes> {
        if opus.len() > vita49::MAX_PAYLOAD_SIZE {
            return Err(Error::InvalidParameter(format!(
                "Opus frame of {} bytes does not fit one packet",
                opus.len()
            )));
        }
        self.is_streaming = true;
        vita49::encode_packet(self.id, class::OPUS, self.tx_sequence.next_sequence(), opus)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
