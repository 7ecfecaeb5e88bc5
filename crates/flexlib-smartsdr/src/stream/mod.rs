//! Binary stream processing: frame types, payload decoders and the
//! delegate seam through which completed frames leave the engine.
//!
//! Two processing shapes exist. Panadapter and waterfall data arrive in
//! segments and go through a [`FrameReassembler`](reassembly::FrameReassembler).
//! Audio, IQ and remote audio arrive one frame per packet and go through a
//! [`SequenceTracker`](sequence::SequenceTracker) followed by a payload
//! decoder. Either way the finished frame is handed to the stream object's
//! [`StreamDelegate`], if one is registered.

pub mod dispatch;
pub mod reassembly;
pub mod sequence;

use std::fmt;

use bytes::{Buf, Bytes};
use tokio::sync::mpsc;

use flexlib_core::StreamId;

use crate::stream::sequence::{SequenceCheck, SequenceTracker};

pub use dispatch::DataDispatcher;
pub use reassembly::{
    FrameReassembler, PANADAPTER_POOL_SIZE, PanadapterFrame, SegmentOutcome, WATERFALL_POOL_SIZE,
    WaterfallFrame,
};
pub use sequence::{SEQUENCE_MODULUS, TxSequence};

/// Native DAX audio sample rate in hertz.
pub const DAX_SAMPLE_RATE: u32 = 24_000;

/// Number of audio channels in a DAX frame (always stereo after decode).
pub const DAX_CHANNELS: u16 = 2;

// ---------------------------------------------------------------------------
// Delegates
// ---------------------------------------------------------------------------

/// Receives completed frames of type `F`.
///
/// Delegates are called on the datagram-draining task while the owning
/// stream's collection is locked, so they must not block.
pub trait StreamDelegate<F>: Send + Sync {
    fn deliver(&self, frame: &F);
}

/// Forward frames into a bounded channel. Frames are dropped when the
/// consumer is not keeping up.
impl<F: Clone + Send + 'static> StreamDelegate<F> for mpsc::Sender<F> {
    fn deliver(&self, frame: &F) {
        if let Err(e) = self.try_send(frame.clone()) {
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    tracing::trace!("Frame dropped, consumer is behind");
                }
                mpsc::error::TrySendError::Closed(_) => {
                    tracing::trace!("Frame dropped, consumer closed");
                }
            }
        }
    }
}

/// An optional registered delegate, held by each streaming object.
pub struct DelegateSlot<F> {
    inner: Option<Box<dyn StreamDelegate<F>>>,
}

impl<F> Default for DelegateSlot<F> {
    fn default() -> Self {
        DelegateSlot { inner: None }
    }
}

impl<F> fmt::Debug for DelegateSlot<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateSlot")
            .field("registered", &self.inner.is_some())
            .finish()
    }
}

impl<F> DelegateSlot<F> {
    pub fn set(&mut self, delegate: Box<dyn StreamDelegate<F>>) {
        self.inner = Some(delegate);
    }

    pub fn clear(&mut self) {
        self.inner = None;
    }

    pub fn is_set(&self) -> bool {
        self.inner.is_some()
    }

    pub fn get(&self) -> Option<&dyn StreamDelegate<F>> {
        self.inner.as_deref()
    }

    /// Deliver `frame` if a delegate is registered.
    pub fn deliver(&self, frame: &F) {
        if let Some(delegate) = &self.inner {
            delegate.deliver(frame);
        }
    }
}

// ---------------------------------------------------------------------------
// Frame types
// ---------------------------------------------------------------------------

/// One packet of decoded audio, interleaved L/R float samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub sequence: u8,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioFrame {
    /// Number of sample frames (samples per channel).
    pub fn frame_count(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }
}

/// One packet of decoded IQ data, interleaved I/Q float samples.
#[derive(Debug, Clone, PartialEq)]
pub struct IqFrame {
    pub sequence: u8,
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

/// Payload of one remote audio packet.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteAudioPayload {
    /// Compressed bytes, handed to an external Opus decoder.
    Opus(Bytes),
    /// Uncompressed interleaved L/R samples.
    Pcm(Vec<f32>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAudioFrame {
    pub sequence: u8,
    pub payload: RemoteAudioPayload,
}

// ---------------------------------------------------------------------------
// Payload decoders
// ---------------------------------------------------------------------------

/// Decode big-endian float32 samples. A trailing partial sample is ignored.
pub fn decode_float32(payload: &[u8]) -> Vec<f32> {
    let mut buf = payload;
    let mut samples = Vec::with_capacity(payload.len() / 4);
    while buf.remaining() >= 4 {
        samples.push(buf.get_f32());
    }
    samples
}

/// Decode big-endian int16 mono samples into interleaved L/R floats in
/// `[-1.0, 1.0)`, duplicating each sample to both channels.
pub fn decode_int16_mono(payload: &[u8]) -> Vec<f32> {
    let mut buf = payload;
    let mut samples = Vec::with_capacity(payload.len());
    while buf.remaining() >= 2 {
        let s = f32::from(buf.get_i16()) / 32768.0;
        samples.push(s);
        samples.push(s);
    }
    samples
}

/// Run the sequence check for a packet, logging gaps and late arrivals.
/// Returns whether the packet should be processed.
pub(crate) fn accept_sequence(
    tracker: &mut SequenceTracker,
    sequence: u8,
    stream_id: StreamId,
) -> bool {
    match tracker.check(sequence) {
        SequenceCheck::InOrder => true,
        SequenceCheck::Gap { lost } => {
            tracing::warn!(
                stream_id = format!("0x{:08X}", stream_id.raw()),
                sequence,
                skipped = lost,
                loss_percent = format!("{:.2}", tracker.loss_percent()),
                "Packet sequence gap"
            );
            true
        }
        SequenceCheck::Late => {
            tracing::trace!(
                stream_id = format!("0x{:08X}", stream_id.raw()),
                sequence,
                "Late or duplicate packet dropped"
            );
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
