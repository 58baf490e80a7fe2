//! HTTP client for the Pingate authorization service.
//!
//! This crate provides:
//! - `HttpGateway`, the reqwest implementation of `VerificationGateway`
//! - Auth header injection from an `AuthContext`
//! - Wire types for the verify, commit and execute endpoints

pub mod auth;
pub mod client;
pub mod wire;

pub use client::HttpGateway;
