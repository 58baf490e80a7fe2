//! PIN protocol domain types.
//!
//! This module defines the explicit protocol state, the transaction gate
//! state and the user inputs both machines accept.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a PIN-gated flow. Exactly one is active at a time.
///
/// Rotation transitions:
/// - CapturingCurrent → VerifyingCurrent (4 digits entered)
/// - VerifyingCurrent → CapturingNew (accepted)
/// - VerifyingCurrent → CapturingCurrent (rejected or network failure)
/// - CapturingNew → CapturingConfirm (4 digits entered)
/// - CapturingNew → CapturingCurrent (back)
/// - CapturingConfirm → CapturingNew (back)
/// - CapturingConfirm → Committing (confirmation matches)
/// - Committing → Success (accepted)
/// - Committing → CapturingCurrent (any failure)
/// - VerifyingCurrent | Committing → Failed (session expired)
/// - any non-terminal state → Idle (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    /// No flow is active (screen closed or cancelled).
    Idle,
    /// Capturing the current PIN.
    CapturingCurrent,
    /// Waiting for the service to verify the current PIN.
    VerifyingCurrent,
    /// Capturing the new PIN.
    CapturingNew,
    /// Capturing the confirmation of the new PIN.
    CapturingConfirm,
    /// Waiting for the service to persist the new PIN.
    Committing,
    /// The flow finished successfully.
    Success,
    /// The flow was abandoned (session expired).
    Failed,
}

impl ProtocolState {
    /// Returns the string representation of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CapturingCurrent => "capturing_current",
            Self::VerifyingCurrent => "verifying_current",
            Self::CapturingNew => "capturing_new",
            Self::CapturingConfirm => "capturing_confirm",
            Self::Committing => "committing",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    /// Returns true if the state accepts digit entry.
    #[must_use]
    pub const fn is_capturing(&self) -> bool {
        matches!(
            self,
            Self::CapturingCurrent | Self::CapturingNew | Self::CapturingConfirm
        )
    }

    /// Returns true while a request is outstanding.
    #[must_use]
    pub const fn is_awaiting_service(&self) -> bool {
        matches!(self, Self::VerifyingCurrent | Self::Committing)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Idle | Self::Success | Self::Failed)
    }
}

impl fmt::Display for ProtocolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the single-PIN transaction gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GateState {
    /// Capturing the PIN.
    CapturingPin,
    /// The PIN and action were sent; waiting for the result.
    Executing,
    /// The action was executed.
    Executed {
        /// Server-issued reference for the receipt screen.
        reference: String,
    },
    /// The action was not executed.
    Failed {
        /// Reason shown on the failure screen.
        reason: String,
    },
    /// The user left before submitting; the action was discarded.
    Cancelled,
}

impl GateState {
    /// Maps the gate state onto the shared protocol state.
    #[must_use]
    pub const fn protocol_state(&self) -> ProtocolState {
        match self {
            Self::CapturingPin => ProtocolState::CapturingCurrent,
            Self::Executing => ProtocolState::Committing,
            Self::Executed { .. } => ProtocolState::Success,
            Self::Failed { .. } => ProtocolState::Failed,
            Self::Cancelled => ProtocolState::Idle,
        }
    }

    /// Returns true once the gate has settled.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.protocol_state().is_terminal()
    }
}

/// A user input on a PIN screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinInput {
    /// A key on the number pad.
    Digit(char),
    /// Delete the last digit.
    Backspace,
    /// Delete every digit of the active step.
    Clear,
    /// The explicit confirm button.
    Submit,
    /// Go back one step.
    Back,
    /// Leave the screen.
    Cancel,
}

impl PinInput {
    /// Short name used in errors and logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Digit(_) => "digit",
            Self::Backspace => "backspace",
            Self::Clear => "clear",
            Self::Submit => "submit",
            Self::Back => "back",
            Self::Cancel => "cancel",
        }
    }
}
