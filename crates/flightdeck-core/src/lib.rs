//! # flightdeck-core
//!
//! Shared types for the Flightdeck booking assistant API.
//!
//! This crate provides:
//! - Configuration types for token issuance, the auth gate, and the
//!   cleanup scheduler
//! - The exclusion-path matcher used to exempt public routes from
//!   authentication

// Configuration types shared across all Flightdeck crates
pub mod config;

// Public-path exclusion matching
pub mod exclude;

// Re-export commonly used types for convenience
pub use config::{AuthConfig, CleanupConfig, ConfigError, SameSite};
pub use exclude::{ExclusionList, ExclusionPattern};
