//! Edge-triggered completion detection over a digit buffer.

use crate::pin::buffer::{DigitBuffer, PinCode};
use crate::pin::error::PinError;

/// Fires once each time a buffer goes from not-full to full.
///
/// Observing an unchanged full buffer again does not fire. The detector
/// re-arms only once the buffer drops below capacity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompletionDetector {
    fired: bool,
}

impl CompletionDetector {
    /// Creates an armed detector.
    #[must_use]
    pub const fn new() -> Self {
        Self { fired: false }
    }

    /// Observes the buffer after a mutation and reports a rising edge.
    pub fn observe(&mut self, buffer: &DigitBuffer) -> bool {
        if !buffer.is_full() {
            self.fired = false;
            return false;
        }
        if self.fired {
            return false;
        }
        self.fired = true;
        true
    }

    /// Returns true if the current fill has already fired.
    #[must_use]
    pub const fn has_fired(&self) -> bool {
        self.fired
    }
}

/// Result of feeding one key into a [`PinPad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadEvent {
    /// Nothing changed.
    Ignored,
    /// The buffer changed but is not newly complete.
    Changed,
    /// The buffer just reached full length.
    Completed,
}

/// A digit buffer paired with its completion detector.
#[derive(Debug, Default)]
pub struct PinPad {
    buffer: DigitBuffer,
    detector: CompletionDetector,
}

impl PinPad {
    /// Creates an empty pad.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Types a digit.
    pub fn type_digit(&mut self, digit: char) -> Result<PadEvent, PinError> {
        if !self.buffer.append(digit)? {
            return Ok(PadEvent::Ignored);
        }
        Ok(self.observe())
    }

    /// Deletes the last digit.
    pub fn backspace(&mut self) -> PadEvent {
        if self.buffer.backspace() {
            self.observe()
        } else {
            PadEvent::Ignored
        }
    }

    /// Clears every digit.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.detector.observe(&self.buffer);
    }

    /// Returns the captured PIN once full.
    #[must_use]
    pub fn code(&self) -> Option<PinCode> {
        self.buffer.code()
    }

    /// Returns true when all digits are entered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.buffer.is_full()
    }

    /// Number of digits entered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true when nothing has been entered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn observe(&mut self) -> PadEvent {
        if self.detector.observe(&self.buffer) {
            PadEvent::Completed
        } else {
            PadEvent::Changed
        }
    }
}
