//! PIN protocol error types.

use thiserror::Error;

use crate::pin::gateway::GatewayError;
use crate::pin::types::ProtocolState;
use pingate_shared::AppError;

/// Errors raised by the PIN protocol itself.
///
/// Credential and network failures are not errors here: the machines turn
/// them into feedback and state changes.
#[derive(Debug, Error)]
pub enum PinError {
    /// A key other than `'0'..='9'` was typed.
    #[error("'{0}' is not a digit")]
    InvalidDigit(char),

    /// A PIN value had the wrong number of digits.
    #[error("PIN must have {expected} digits, got {actual}")]
    IncompletePin {
        /// Required number of digits.
        expected: usize,
        /// Digits supplied.
        actual: usize,
    },

    /// An event arrived that the current state cannot accept.
    #[error("Cannot handle {event} while {state}")]
    InvalidTransition {
        /// The state the machine was in.
        state: ProtocolState,
        /// The offending event.
        event: &'static str,
    },

    /// The pending action was already handed to the executor.
    #[error("Pending action already consumed")]
    ActionConsumed,

    /// The session was cancelled while a request was in flight.
    #[error("Session cancelled")]
    Cancelled,
}

impl From<PinError> for AppError {
    fn from(err: PinError) -> Self {
        match err {
            PinError::InvalidDigit(_) | PinError::IncompletePin { .. } => {
                Self::Validation(err.to_string())
            }
            PinError::Cancelled => Self::Cancelled,
            PinError::InvalidTransition { .. } | PinError::ActionConsumed => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::SessionExpired => Self::SessionExpired,
            GatewayError::Timeout => Self::Timeout,
            GatewayError::Transport(_)
            | GatewayError::Server { .. }
            | GatewayError::InvalidResponse(_) => Self::Network(err.to_string()),
        }
    }
}
