//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// The session is no longer valid; the user must sign in again.
    #[error("Session expired, please sign in again")]
    SessionExpired,

    /// The authorization service refused the credential or action.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network or transport failure talking to the authorization service.
    #[error("Network error: {0}")]
    Network(String),

    /// The authorization service did not answer in time.
    #[error("Request timed out")]
    Timeout,

    /// The user left the screen before the flow finished.
    #[error("Cancelled")]
    Cancelled,

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code used in logs and client telemetry.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::Rejected(_) => "REJECTED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true when the current flow must be abandoned.
    ///
    /// Recoverable errors let the user retry from the same screen.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired | Self::Cancelled | Self::Configuration(_) | Self::Internal(_)
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
