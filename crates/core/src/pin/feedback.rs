//! Failure feedback: a shake signal plus a message.

use crate::pin::gateway::GatewayError;

/// Message used when the service rejects a PIN without a reason.
pub const DEFAULT_REJECTION: &str = "Incorrect PIN";

/// Message used when the confirmation differs from the new PIN.
pub const MISMATCH_MESSAGE: &str = "PINs do not match";

/// Kind of failure being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    /// The service rejected the current PIN.
    InvalidCredential,
    /// Confirmation did not match the new PIN.
    Mismatch,
    /// The service could not be reached or answered garbage.
    Network,
    /// The new PIN was not persisted.
    CommitFailed,
    /// The gated action was refused.
    ActionFailed,
    /// The session is no longer valid.
    SessionExpired,
}

/// A single user-facing failure report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    /// What went wrong.
    pub kind: FeedbackKind,
    /// Message shown to the user.
    pub message: String,
    /// Whether the PIN field should shake.
    pub shake: bool,
}

impl Feedback {
    /// Rejected PIN, with the service's reason when it gave one.
    #[must_use]
    pub fn invalid_credential(reason: &str) -> Self {
        Self::shaking(FeedbackKind::InvalidCredential, reason_or_default(reason))
    }

    /// Confirmation mismatch.
    #[must_use]
    pub fn mismatch() -> Self {
        Self::shaking(FeedbackKind::Mismatch, MISMATCH_MESSAGE.to_string())
    }

    /// Commit refused by the service.
    #[must_use]
    pub fn commit_failed(reason: &str) -> Self {
        Self::shaking(FeedbackKind::CommitFailed, reason_or_default(reason))
    }

    /// Gated action refused by the service.
    #[must_use]
    pub fn action_failed(reason: &str) -> Self {
        Self::shaking(FeedbackKind::ActionFailed, reason_or_default(reason))
    }

    /// Transport or protocol failure.
    #[must_use]
    pub fn from_gateway_error(err: &GatewayError) -> Self {
        match err {
            GatewayError::SessionExpired => Self {
                kind: FeedbackKind::SessionExpired,
                message: err.user_message().to_string(),
                shake: false,
            },
            _ => Self::shaking(FeedbackKind::Network, err.user_message().to_string()),
        }
    }

    fn shaking(kind: FeedbackKind, message: String) -> Self {
        Self {
            kind,
            message,
            shake: true,
        }
    }
}

fn reason_or_default(reason: &str) -> String {
    let reason = reason.trim();
    if reason.is_empty() {
        DEFAULT_REJECTION.to_string()
    } else {
        reason.to_string()
    }
}

/// Holds the feedback currently on screen.
///
/// `shake_count` increases with every shaking report so a view can animate
/// on each new failure even when the message repeats.
#[derive(Debug, Default, Clone)]
pub struct FeedbackChannel {
    current: Option<Feedback>,
    shake_count: u64,
}

impl FeedbackChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a failure and returns it.
    pub fn emit(&mut self, feedback: Feedback) -> Feedback {
        if feedback.shake {
            self.shake_count += 1;
        }
        self.current = Some(feedback.clone());
        feedback
    }

    /// Removes the message, typically when the user starts typing again.
    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// The message currently shown.
    #[must_use]
    pub const fn current(&self) -> Option<&Feedback> {
        self.current.as_ref()
    }

    /// Number of shake signals emitted so far.
    #[must_use]
    pub const fn shake_count(&self) -> u64 {
        self.shake_count
    }
}
