//! Verification gateway contract.
//!
//! The gateway sends captured digits to the authorization service and reports
//! what the service said. It never touches protocol state; the machines
//! interpret the outcome and drive their own transitions.

use async_trait::async_trait;
use thiserror::Error;

use crate::pin::buffer::PinCode;
use pingate_shared::types::PendingAction;

/// Answer to a verify or commit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The service accepted the PIN.
    Accepted,
    /// The service refused the PIN.
    Rejected {
        /// Human-readable reason, shown verbatim.
        reason: String,
    },
}

/// Answer to a combined verify-and-execute request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The action was performed.
    Executed {
        /// Server-issued reference.
        reference: String,
    },
    /// The PIN or the action was refused.
    Rejected {
        /// Human-readable reason, shown verbatim.
        reason: String,
    },
}

/// Failures reaching or understanding the authorization service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The service answered 401; the user must sign in again.
    #[error("session expired")]
    SessionExpired,

    /// No answer within the client-side timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service failed with a server error.
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Body or reason phrase.
        message: String,
    },

    /// The body could not be understood.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Message shown to the user for this failure.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::SessionExpired => "Session expired, please sign in again",
            Self::Timeout => "The request timed out, please try again",
            Self::Transport(_) => "Network error, please try again",
            Self::Server { .. } => "Service unavailable, please try again",
            Self::InvalidResponse(_) => "Unexpected response from server",
        }
    }
}

/// Client of the remote authorization service.
///
/// Implementations attach the auth context out-of-band; callers only pass
/// the captured digits.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationGateway: Send + Sync {
    /// Checks the current PIN.
    async fn verify_current(&self, pin: &PinCode) -> Result<VerifyOutcome, GatewayError>;

    /// Persists a new PIN.
    async fn commit_new(&self, pin: &PinCode) -> Result<VerifyOutcome, GatewayError>;

    /// Validates the PIN and performs the action in a single call.
    async fn execute_action(
        &self,
        pin: &PinCode,
        action: &PendingAction,
    ) -> Result<ExecutionOutcome, GatewayError>;
}
