//! Shared utilities for tokenauth crates
//!
//! - Settings management following 12-factor principles
//! - Timing-safe secret comparison

pub mod config;
pub mod crypto;

pub use config::{ServerConfig, TokenAuthSettings};
pub use crypto::secure_compare;
