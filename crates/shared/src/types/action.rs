//! Pending actions awaiting PIN authorization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ActionId;
use super::money::Money;
use crate::error::{AppError, AppResult};

/// An already-assembled operation payload awaiting authorization.
///
/// The confirmation screen builds this before PIN capture begins and hands it
/// to the transaction gate by value. The gate forwards it to the executor
/// once, so a consumed action cannot be resubmitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAction {
    /// Client-side identifier, also used as the idempotency key.
    pub id: ActionId,
    /// Recipient identifier (wallet, phone number or account).
    pub recipient: String,
    /// Amount and currency to transfer.
    #[serde(flatten)]
    pub money: Money,
    /// Free-form description shown on the receipt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the payload was assembled.
    pub prepared_at: DateTime<Utc>,
}

impl PendingAction {
    /// Assembles a new pending action.
    #[must_use]
    pub fn new(recipient: impl Into<String>, money: Money, description: Option<String>) -> Self {
        Self {
            id: ActionId::new(),
            recipient: recipient.into(),
            money,
            description,
            prepared_at: Utc::now(),
        }
    }

    /// Assembles a pending action from user input.
    ///
    /// # Errors
    ///
    /// * `AppError::Validation` for a blank recipient or a non-positive amount
    pub fn prepare(
        recipient: impl Into<String>,
        money: Money,
        description: Option<String>,
    ) -> AppResult<Self> {
        let recipient = recipient.into();
        if recipient.trim().is_empty() {
            return Err(AppError::Validation("recipient is required".to_string()));
        }
        if !money.is_positive() {
            return Err(AppError::Validation(format!(
                "amount must be positive, got {money}"
            )));
        }
        Ok(Self::new(recipient.trim(), money, description))
    }
}
