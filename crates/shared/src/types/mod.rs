//! Common types used across the workspace.

pub mod action;
pub mod id;
pub mod money;

pub use action::PendingAction;
pub use id::*;
pub use money::{Currency, Money};
