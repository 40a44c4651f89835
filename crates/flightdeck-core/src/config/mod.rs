//! Configuration types for the Flightdeck API.
//!
//! These types are deserialized from the server's TOML configuration file
//! and shared across crates. Every field carries a default so a missing
//! file or section still yields a runnable configuration.

pub mod auth;
pub mod cleanup;

use thiserror::Error;

pub use auth::{AuthConfig, SameSite};
pub use cleanup::CleanupConfig;

/// Errors produced when validating configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric setting is outside its allowed range.
    #[error("{field} ({value}) must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}
