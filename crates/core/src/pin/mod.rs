//! PIN-gated authorization protocol.
//!
//! Digits are captured into zeroizing buffers, completion is detected on the
//! last digit, and a single in-flight request carries them to the
//! authorization service. Two flows share these pieces: a multi-step PIN
//! rotation and a single-PIN gate in front of a pending action.
//!
//! # Modules
//!
//! - `buffer` - Fixed-capacity digit buffer and the `PinCode` value
//! - `detector` - Completion detection and the keypad wrapper
//! - `guard` - Single-flight latch for outbound requests
//! - `gateway` - Authorization service contract
//! - `feedback` - Shake signal and failure messages
//! - `rotation` - Verify-old, capture-new, confirm, commit
//! - `gate` - One PIN in front of one pending action
//! - `session` - Async drivers with timeout and cancellation

pub mod buffer;
pub mod detector;
pub mod error;
pub mod feedback;
pub mod gate;
pub mod gateway;
pub mod guard;
pub mod rotation;
pub mod session;
pub mod types;

#[cfg(test)]
mod rotation_props;

pub use buffer::{DigitBuffer, PIN_LENGTH, PinCode};
pub use detector::{CompletionDetector, PadEvent, PinPad};
pub use error::PinError;
pub use feedback::{Feedback, FeedbackChannel, FeedbackKind};
pub use gate::{GateEffect, GateEvent, TransactionGate};
pub use gateway::{ExecutionOutcome, GatewayError, VerificationGateway, VerifyOutcome};
pub use guard::{FlightPermit, SingleFlightGuard};
pub use rotation::{BufferLengths, RotationEffect, RotationEvent, RotationMachine};
pub use session::{GateSession, RotationSession, SessionSettings};
pub use types::{GateState, PinInput, ProtocolState};
