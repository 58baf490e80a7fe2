//! Shared types, errors, and configuration for Pingate.
//!
//! This crate provides common types used across all other crates:
//! - Money types with decimal precision
//! - Typed IDs and the `PendingAction` payload
//! - The injected `AuthContext`
//! - Application-wide error types
//! - Configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod types;

pub use auth::AuthContext;
pub use config::{AppConfig, AuthConfig, EndpointConfig, GatewayConfig, PinConfig};
pub use error::{AppError, AppResult};
