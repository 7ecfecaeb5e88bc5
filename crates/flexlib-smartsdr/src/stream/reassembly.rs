//! Multi-segment frame reassembly for panadapter and waterfall streams.
//!
//! A panadapter or waterfall frame is usually larger than one UDP packet,
//! so the radio splits it into segments. Each segment carries a fixed
//! big-endian header (starting bin, segment bin count, total frame bin
//! count, frame number plus kind-specific metadata) followed by u16 bins.
//!
//! [`FrameReassembler`] accumulates segments into a small pool of reusable
//! frame buffers and hands each completed frame to a delegate. It never
//! waits for missing data: a frame-number mismatch counts the skipped
//! frames as dropped and resynchronizes on the received number.

use bytes::Buf;

use flexlib_core::{Error, Result};

use super::StreamDelegate;

/// Frame buffers kept per panadapter.
pub const PANADAPTER_POOL_SIZE: usize = 16;

/// Frame buffers kept per waterfall.
pub const WATERFALL_POOL_SIZE: usize = 10;

/// Waterfall frequencies are fixed-point with 20 fractional bits.
const WATERFALL_FREQ_SCALE: f64 = 1_048_576.0;

/// The fields every segment header carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentHeader {
    pub starting_bin: u16,
    pub segment_bin_count: u16,
    pub frame_bin_count: u16,
    pub frame_number: u32,
}

/// A frame type that arrives in segments.
pub trait SegmentedFrame: Default + Send + 'static {
    /// Kind-specific header fields copied into the frame.
    type Meta: Copy + Default + Send;

    /// Size of the segment header in bytes.
    const HEADER_SIZE: usize;

    /// Decode the header at the front of `buf`, advancing past it.
    /// `buf` holds at least [`HEADER_SIZE`](Self::HEADER_SIZE) bytes.
    fn decode_header(buf: &mut &[u8]) -> (SegmentHeader, Self::Meta);

    /// Prepare the buffer for a new frame of `frame_bin_count` bins.
    fn begin(&mut self, header: &SegmentHeader, meta: &Self::Meta);

    /// Bin storage, `frame_bin_count` long after [`begin`](Self::begin).
    fn bins_mut(&mut self) -> &mut [u16];
}

// ---------------------------------------------------------------------------
// Frame types
// ---------------------------------------------------------------------------

/// One complete panadapter (FFT) frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanadapterFrame {
    pub frame_number: u32,
    /// Bytes per bin as reported by the radio.
    pub bin_size: u16,
    pub bins: Vec<u16>,
}

/// Panadapter metadata not shared with other segmented kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanadapterMeta {
    pub bin_size: u16,
}

impl SegmentedFrame for PanadapterFrame {
    type Meta = PanadapterMeta;

    // starting_bin, segment_bin_count, bin_size, frame_bin_count: u16; frame_number: u32
    const HEADER_SIZE: usize = 12;

    fn decode_header(buf: &mut &[u8]) -> (SegmentHeader, PanadapterMeta) {
        let starting_bin = buf.get_u16();
        let segment_bin_count = buf.get_u16();
        let bin_size = buf.get_u16();
        let frame_bin_count = buf.get_u16();
        let frame_number = buf.get_u32();
        (
            SegmentHeader {
                starting_bin,
                segment_bin_count,
                frame_bin_count,
                frame_number,
            },
            PanadapterMeta { bin_size },
        )
    }

    fn begin(&mut self, header: &SegmentHeader, meta: &PanadapterMeta) {
        self.frame_number = header.frame_number;
        self.bin_size = meta.bin_size;
        self.bins.clear();
        self.bins.resize(usize::from(header.frame_bin_count), 0);
    }

    fn bins_mut(&mut self) -> &mut [u16] {
        &mut self.bins
    }
}

/// One complete waterfall line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaterfallFrame {
    pub frame_number: u32,
    /// Frequency of the first bin, in Hz.
    pub first_bin_freq: f64,
    /// Width of each bin, in Hz.
    pub bin_bandwidth: f64,
    /// Line duration in milliseconds.
    pub line_duration: u32,
    pub height: u16,
    pub auto_black_level: u32,
    pub bins: Vec<u16>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WaterfallMeta {
    pub first_bin_freq: f64,
    pub bin_bandwidth: f64,
    pub line_duration: u32,
    pub height: u16,
    pub auto_black_level: u32,
}

impl SegmentedFrame for WaterfallFrame {
    type Meta = WaterfallMeta;

    const HEADER_SIZE: usize = 36;

    fn decode_header(buf: &mut &[u8]) -> (SegmentHeader, WaterfallMeta) {
        let first_bin_freq = buf.get_i64() as f64 / WATERFALL_FREQ_SCALE;
        let bin_bandwidth = buf.get_i64() as f64 / WATERFALL_FREQ_SCALE;
        let line_duration = buf.get_u32();
        let segment_bin_count = buf.get_u16();
        let height = buf.get_u16();
        let frame_number = buf.get_u32();
        let auto_black_level = buf.get_u32();
        let frame_bin_count = buf.get_u16();
        let starting_bin = buf.get_u16();
        (
            SegmentHeader {
                starting_bin,
                segment_bin_count,
                frame_bin_count,
                frame_number,
            },
            WaterfallMeta {
                first_bin_freq,
                bin_bandwidth,
                line_duration,
                height,
                auto_black_level,
            },
        )
    }

    fn begin(&mut self, header: &SegmentHeader, meta: &WaterfallMeta) {
        self.frame_number = header.frame_number;
        self.first_bin_freq = meta.first_bin_freq;
        self.bin_bandwidth = meta.bin_bandwidth;
        self.line_duration = meta.line_duration;
        self.height = meta.height;
        self.auto_black_level = meta.auto_black_level;
        self.bins.clear();
        self.bins.resize(usize::from(header.frame_bin_count), 0);
    }

    fn bins_mut(&mut self) -> &mut [u16] {
        &mut self.bins
    }
}

/// Decode just the segment header of a payload, without touching any
/// reassembler state.
pub fn decode_segment_header<F: SegmentedFrame>(payload: &[u8]) -> Result<(SegmentHeader, F::Meta)> {
    if payload.len() < F::HEADER_SIZE {
        return Err(Error::InvalidFrame(format!(
            "segment payload too short: {} bytes, header is {}",
            payload.len(),
            F::HEADER_SIZE
        )));
    }
    let mut buf = payload;
    Ok(F::decode_header(&mut buf))
}

// ---------------------------------------------------------------------------
// Reassembler
// ---------------------------------------------------------------------------

/// Result of feeding one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentOutcome {
    /// The segment failed validation; no state changed.
    Rejected,
    /// The segment was accepted; the frame is not yet complete.
    Accumulating,
    /// The segment completed a frame, which was handed to the delegate.
    Completed,
}

/// Accumulates segments into a rotating pool of frame buffers.
#[derive(Debug)]
pub struct FrameReassembler<F: SegmentedFrame> {
    pool: Vec<F>,
    cursor: usize,
    expected_frame: Option<u32>,
    accumulated: usize,
    /// Track gaps and completions only, without copying bins.
    conformance: bool,
    frames_completed: u64,
    frames_dropped: u64,
    segments_rejected: u64,
}

impl<F: SegmentedFrame> FrameReassembler<F> {
    /// Create a reassembler with `pool_size` frame buffers.
    pub fn new(pool_size: usize) -> Self {
        let pool_size = pool_size.max(1);
        FrameReassembler {
            pool: (0..pool_size).map(|_| F::default()).collect(),
            cursor: 0,
            expected_frame: None,
            accumulated: 0,
            conformance: false,
            frames_completed: 0,
            frames_dropped: 0,
            segments_rejected: 0,
        }
    }

    /// Create a reassembler that runs the same gap/resync logic without
    /// copying bin data. Accumulation only starts at a segment whose
    /// starting bin is 0.
    pub fn conformance(pool_size: usize) -> Self {
        FrameReassembler {
            conformance: true,
            ..Self::new(pool_size)
        }
    }

    pub fn expected_frame(&self) -> Option<u32> {
        self.expected_frame
    }

    pub fn frames_completed(&self) -> u64 {
        self.frames_completed
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }

    pub fn segments_rejected(&self) -> u64 {
        self.segments_rejected
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Bins accumulated toward the frame in progress.
    pub fn accumulated(&self) -> usize {
        self.accumulated
    }

    /// Feed one segment payload (header plus bins).
    ///
    /// Segments with a zero frame bin count, whose bins would overrun the
    /// frame, or whose frame bin count disagrees with the frame in progress
    /// are rejected without changing any state. Those are expected
    /// while a stream is starting up and are not logged above trace.
    pub fn push(&mut self, payload: &[u8], delegate: Option<&dyn StreamDelegate<F>>) -> SegmentOutcome {
        let (header, meta) = match decode_segment_header::<F>(payload) {
            Ok(h) => h,
            Err(e) => {
                tracing::trace!(error = %e, "Segment rejected");
                self.segments_rejected += 1;
                return SegmentOutcome::Rejected;
            }
        };

        let start = usize::from(header.starting_bin);
        let count = usize::from(header.segment_bin_count);
        let total = usize::from(header.frame_bin_count);
        let bin_bytes = &payload[F::HEADER_SIZE..];

        if total == 0 || start + count > total || bin_bytes.len() < count * 2 {
            tracing::trace!(
                starting_bin = start,
                segment_bin_count = count,
                frame_bin_count = total,
                "Segment rejected"
            );
            self.segments_rejected += 1;
            return SegmentOutcome::Rejected;
        }

        if self.conformance && self.accumulated == 0 && start != 0 {
            tracing::trace!(starting_bin = start, "Waiting for a frame start");
            return SegmentOutcome::Accumulating;
        }

        match self.expected_frame {
            Some(expected) if expected != header.frame_number => {
                let skipped = header.frame_number.saturating_sub(expected);
                tracing::warn!(
                    expected,
                    received = header.frame_number,
                    skipped,
                    "Frame gap"
                );
                self.frames_dropped += u64::from(skipped);
                self.expected_frame = Some(header.frame_number);
                self.accumulated = 0;
            }
            Some(_) => {}
            None => self.expected_frame = Some(header.frame_number),
        }

        if self.conformance && self.accumulated == 0 && start != 0 {
            return SegmentOutcome::Accumulating;
        }

        let frame = &mut self.pool[self.cursor];
        if self.accumulated == 0 {
            frame.begin(&header, &meta);
        } else if frame.bins_mut().len() != total {
            // Same frame number, different frame size: the buffer no longer fits.
            tracing::trace!(
                frame_bin_count = total,
                active = frame.bins_mut().len(),
                "Segment rejected"
            );
            self.segments_rejected += 1;
            return SegmentOutcome::Rejected;
        }

        if !self.conformance {
            let mut src = &bin_bytes[..count * 2];
            for bin in &mut frame.bins_mut()[start..start + count] {
                *bin = src.get_u16();
            }
        }

        self.accumulated += count;
        if self.accumulated < total {
            return SegmentOutcome::Accumulating;
        }

        if !self.conformance {
            if let Some(delegate) = delegate {
                delegate.deliver(&self.pool[self.cursor]);
            }
        }
        self.frames_completed += 1;
        self.expected_frame = Some(header.frame_number.wrapping_add(1));
        self.accumulated = 0;
        self.cursor = (self.cursor + 1) % self.pool.len();
        SegmentOutcome::Completed
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect<F: Clone>(Mutex<Vec<F>>);

    impl<F: Clone + Send + 'static> StreamDelegate<F> for Collect<F> {
        fn deliver(&self, frame: &F) {
            self.0.lock().unwrap().push(frame.clone());
        }
    }

    fn pan_segment(start: u16, count: u16, total: u16, frame: u32, bins: &[u16]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&start.to_be_bytes());
        v.extend_from_slice(&count.to_be_bytes());
        v.extend_from_slice(&2u16.to_be_bytes());
        v.extend_from_slice(&total.to_be_bytes());
        v.extend_from_slice(&frame.to_be_bytes());
        for b in bins {
            v.extend_from_slice(&b.to_be_bytes());
        }
        v
    }

    fn wf_segment(start: u16, count: u16, total: u16, frame: u32, bins: &[u16]) -> Vec<u8> {
        let mut v = Vec::new();
        v.extend_from_slice(&(14_000_000i64 * 1_048_576).to_be_bytes());
        v.extend_from_slice(&(100i64 * 1_048_576).to_be_bytes());
        v.extend_from_slice(&100u32.to_be_bytes());
        v.extend_from_slice(&count.to_be_bytes());
        v.extend_from_slice(&1u16.to_be_bytes());
        v.extend_from_slice(&frame.to_be_bytes());
        v.extend_from_slice(&7u32.to_be_bytes());
        v.extend_from_slice(&total.to_be_bytes());
        v.extend_from_slice(&start.to_be_bytes());
        for b in bins {
            v.extend_from_slice(&b.to_be_bytes());
        }
        v
    }

    #[test]
    fn tiled_segments_complete_one_frame() {
        let sink = Collect::<PanadapterFrame>::default();
        let mut r = FrameReassembler::<PanadapterFrame>::new(PANADAPTER_POOL_SIZE);

        let a = pan_segment(0, 3, 6, 0, &[0x0102, 0x0304, 0x0506]);
        let b = pan_segment(3, 3, 6, 0, &[0xA0B0, 0xC0D0, 0xE0F0]);
        assert_eq!(r.push(&a, Some(&sink)), SegmentOutcome::Accumulating);
        assert_eq!(r.push(&b, Some(&sink)), SegmentOutcome::Completed);

        let frames = sink.0.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].bins,
            vec![0x0102, 0x0304, 0x0506, 0xA0B0, 0xC0D0, 0xE0F0]
        );
        assert_eq!(frames[0].bin_size, 2);
        assert_eq!(r.expected_frame(), Some(1));
        assert_eq!(r.accumulated(), 0);
    }

    #[test]
    fn zero_total_is_rejected() {
        let mut r = FrameReassembler::<PanadapterFrame>::new(4);
        let seg = pan_segment(0, 0, 0, 5, &[]);
        assert_eq!(r.push(&seg, None), SegmentOutcome::Rejected);
        assert_eq!(r.expected_frame(), None);
        assert_eq!(r.segments_rejected(), 1);
    }

    #[test]
    fn overrun_is_rejected_without_state_change() {
        let mut r = FrameReassembler::<PanadapterFrame>::new(4);
        r.push(&pan_segment(0, 2, 4, 9, &[1, 2]), None);
        let bad = pan_segment(3, 2, 4, 9, &[3, 4]);
        assert_eq!(r.push(&bad, None), SegmentOutcome::Rejected);
        assert_eq!(r.accumulated(), 2);
        assert_eq!(r.expected_frame(), Some(9));
    }

    #[test]
    fn resized_frame_mid_accumulation_is_rejected() {
        let sink = Collect::<PanadapterFrame>::default();
        let mut r = FrameReassembler::<PanadapterFrame>::new(4);
        r.push(&pan_segment(0, 2, 4, 7, &[1, 2]), Some(&sink));
        let grown = pan_segment(4, 4, 8, 7, &[3, 4, 5, 6]);
        assert_eq!(r.push(&grown, Some(&sink)), SegmentOutcome::Rejected);
        assert_eq!(r.accumulated(), 2);
        assert_eq!(r.expected_frame(), Some(7));
        assert_eq!(r.segments_rejected(), 1);

        // The original frame still completes.
        assert_eq!(
            r.push(&pan_segment(2, 2, 4, 7, &[3, 4]), Some(&sink)),
            SegmentOutcome::Completed
        );
        assert_eq!(sink.0.lock().unwrap()[0].bins, vec![1, 2, 3, 4]);
    }

    #[test]
    fn short_payload_is_rejected() {
        let mut r = FrameReassembler::<PanadapterFrame>::new(4);
        assert_eq!(r.push(&[0u8; 5], None), SegmentOutcome::Rejected);
        let mut truncated = pan_segment(0, 4, 4, 0, &[1, 2, 3, 4]);
        truncated.truncate(14);
        assert_eq!(r.push(&truncated, None), SegmentOutcome::Rejected);
    }

    #[test]
    fn gap_resynchronizes_forward() {
        let sink = Collect::<PanadapterFrame>::default();
        let mut r = FrameReassembler::<PanadapterFrame>::new(PANADAPTER_POOL_SIZE);
        r.push(&pan_segment(0, 2, 2, 0, &[1, 1]), Some(&sink));
        r.push(&pan_segment(0, 2, 2, 1, &[2, 2]), Some(&sink));
        // Frame 3 arrives in two segments; only the first is fed.
        r.push(&pan_segment(0, 1, 2, 3, &[3]), Some(&sink));

        assert_eq!(r.expected_frame(), Some(3));
        assert_eq!(r.frames_dropped(), 1);
        let frames = sink.0.lock().unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.frame_number != 2));
    }

    #[test]
    fn partial_frame_abandoned_on_new_number() {
        let sink = Collect::<PanadapterFrame>::default();
        let mut r = FrameReassembler::<PanadapterFrame>::new(4);
        r.push(&pan_segment(0, 2, 4, 10, &[1, 2]), Some(&sink));
        r.push(&pan_segment(0, 4, 4, 11, &[5, 6, 7, 8]), Some(&sink));
        let frames = sink.0.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].frame_number, 11);
        assert_eq!(frames[0].bins, vec![5, 6, 7, 8]);
        assert_eq!(r.frames_dropped(), 1);
    }

    #[test]
    fn pool_cursor_wraps() {
        let mut r = FrameReassembler::<PanadapterFrame>::new(2);
        for n in 0..5 {
            assert_eq!(
                r.push(&pan_segment(0, 1, 1, n, &[n as u16]), None),
                SegmentOutcome::Completed
            );
        }
        assert_eq!(r.frames_completed(), 5);
        assert_eq!(r.pool_size(), 2);
    }

    #[test]
    fn waterfall_header_layout() {
        let sink = Collect::<WaterfallFrame>::default();
        let mut r = FrameReassembler::<WaterfallFrame>::new(WATERFALL_POOL_SIZE);
        r.push(&wf_segment(2, 2, 4, 42, &[30, 40]), Some(&sink));
        r.push(&wf_segment(0, 2, 4, 42, &[10, 20]), Some(&sink));

        let frames = sink.0.lock().unwrap();
        assert_eq!(frames.len(), 1);
        let f = &frames[0];
        assert_eq!(f.frame_number, 42);
        assert_eq!(f.first_bin_freq, 14_000_000.0);
        assert_eq!(f.bin_bandwidth, 100.0);
        assert_eq!(f.line_duration, 100);
        assert_eq!(f.height, 1);
        assert_eq!(f.auto_black_level, 7);
        assert_eq!(f.bins, vec![10, 20, 30, 40]);
    }

    #[test]
    fn conformance_waits_for_frame_start() {
        let sink = Collect::<PanadapterFrame>::default();
        let mut r = FrameReassembler::<PanadapterFrame>::conformance(PANADAPTER_POOL_SIZE);
        // Mid-frame segment first: ignored.
        r.push(&pan_segment(2, 2, 4, 0, &[3, 4]), Some(&sink));
        assert_eq!(r.expected_frame(), None);
        r.push(&pan_segment(0, 2, 4, 1, &[1, 2]), Some(&sink));
        assert_eq!(
            r.push(&pan_segment(2, 2, 4, 1, &[3, 4]), Some(&sink)),
            SegmentOutcome::Completed
        );
        assert_eq!(r.frames_completed(), 1);
        assert_eq!(r.expected_frame(), Some(2));
        assert!(sink.0.lock().unwrap().is_empty());
    }
}
