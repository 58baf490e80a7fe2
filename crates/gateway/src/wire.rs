//! Request and response bodies of the authorization service.

use serde::{Deserialize, Serialize};

use pingate_shared::types::PendingAction;

/// Body of the verify-current call.
#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    /// The current PIN.
    pub pin: &'a str,
}

/// Body of the commit-new call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest<'a> {
    /// The new PIN.
    pub new_pin: &'a str,
}

/// Body of the execute call: the PIN and the action travel together.
#[derive(Debug, Serialize)]
pub struct ExecuteRequest<'a> {
    /// The PIN authorizing the action.
    pub pin: &'a str,
    /// The action to perform.
    pub action: &'a PendingAction,
}

/// Failure details; the service fills one or both fields.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    /// Error code or message.
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Parses a failure body, tolerating empty or non-JSON payloads.
    #[must_use]
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    /// Reason to show the user; empty when the service gave none.
    #[must_use]
    pub fn reason(self) -> String {
        self.message
            .filter(|m| !m.trim().is_empty())
            .or(self.error)
            .unwrap_or_default()
    }
}

/// Answer to verify and commit calls.
#[derive(Debug, Deserialize)]
pub struct AckResponse {
    /// Whether the PIN was accepted.
    #[serde(default)]
    pub ok: bool,
    /// Failure details when `ok` is false.
    #[serde(flatten)]
    pub failure: ErrorBody,
}

/// Answer to the execute call.
#[derive(Debug, Deserialize)]
pub struct ExecuteResponse {
    /// Whether the action was performed.
    #[serde(default)]
    pub success: bool,
    /// Server-issued reference, present on success.
    #[serde(default)]
    pub reference: Option<String>,
    /// Failure details when `success` is false.
    #[serde(flatten)]
    pub failure: ErrorBody,
}
