//! Four-bit packet sequence tracking for single-packet streams.
//!
//! Every VITA-49 packet carries a 0-15 wrapping counter. Receive streams
//! use [`SequenceTracker`] to classify each packet against the value they
//! expected; transmit streams use [`TxSequence`] to stamp outgoing ones.
//!
//! The comparison is on raw integers, not modulo-aware. A packet that wraps
//! past an outstanding gap (expected 14, received 1) therefore looks late
//! and is dropped; the next in-order packet resynchronizes.

/// Sequence numbers wrap at this value.
pub const SEQUENCE_MODULUS: u8 = 16;

/// Classification of one received sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceCheck {
    /// The expected number, or the first packet of the stream.
    InOrder,
    /// Ahead of the expected number; `lost` packets were skipped.
    Gap { lost: u8 },
    /// Behind the expected number: a delayed or duplicated packet.
    Late,
}

impl SequenceCheck {
    /// Whether the packet should be decoded and delivered.
    pub fn accepted(self) -> bool {
        !matches!(self, SequenceCheck::Late)
    }
}

/// Receive-side continuity state of one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceTracker {
    expected: Option<u8>,
    received: u64,
    lost: u64,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next sequence number the stream expects, `None` before the
    /// first packet.
    pub fn expected(&self) -> Option<u8> {
        self.expected
    }

    /// Packets seen, including late ones.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Gaps observed.
    pub fn lost(&self) -> u64 {
        self.lost
    }

    /// `lost / received` as a percentage.
    pub fn loss_percent(&self) -> f64 {
        if self.received == 0 {
            0.0
        } else {
            self.lost as f64 * 100.0 / self.received as f64
        }
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Classify `sequence` and advance state.
    ///
    /// Late packets leave the expected number untouched. Every other
    /// packet sets it to `(sequence + 1) % 16`.
    pub fn check(&mut self, sequence: u8) -> SequenceCheck {
        let sequence = sequence % SEQUENCE_MODULUS;
        self.received += 1;

        let outcome = match self.expected {
            None => SequenceCheck::InOrder,
            Some(expected) if sequence == expected => SequenceCheck::InOrder,
            Some(expected) if sequence < expected => return SequenceCheck::Late,
            Some(expected) => {
                self.lost += 1;
                SequenceCheck::Gap {
                    lost: sequence - expected,
                }
            }
        };

        self.expected = Some((sequence + 1) % SEQUENCE_MODULUS);
        outcome
    }
}

/// Transmit-side counter stamping successive 0-15 values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxSequence {
    next: u8,
}

impl TxSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the current value and advance.
    pub fn next_sequence(&mut self) -> u8 {
        let value = self.next;
        self.next = (self.next + 1) % SEQUENCE_MODULUS;
        value
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
