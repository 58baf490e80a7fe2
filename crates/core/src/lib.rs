//! Core protocol logic for Pingate.
//!
//! This crate contains the PIN authorization protocol with ZERO HTTP
//! dependencies. The state machines are pure; the async sessions reach the
//! network only through the `VerificationGateway` trait.
//!
//! # Modules
//!
//! - `pin` - Digit capture, completion detection, rotation and gated execution

pub mod pin;
