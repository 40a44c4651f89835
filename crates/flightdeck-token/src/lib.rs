//! # flightdeck-token
//!
//! Access token handling for the Flightdeck booking assistant API.
//!
//! This crate provides functionality for:
//! - Issuing signed, time-boxed access tokens carrying a subject
//! - Verifying tokens: signature, structure, and expiry
//! - Resolving the process-wide signing secret from configuration
//! - A wall-clock abstraction so expiry can be tested deterministically
//!
//! ## Token shape
//!
//! Tokens are compact three-segment strings,
//! `base64url(header).base64url(claims).base64url(signature)`, signed with
//! HMAC-SHA256 over the first two segments. A token is a pure function of
//! the clock, the secret, and the subject; refreshing produces a new token
//! and never mutates an old one.
//!
//! Verification is deliberately uniform towards callers: whatever the
//! internal cause (bad structure, bad signature, past expiry), the gate
//! surfaces a single indistinguishable failure so the token endpoint cannot
//! be used as an oracle.

pub mod claims;
pub mod clock;
pub mod codec;
pub mod error;
pub mod secret;

pub use claims::AccessClaims;
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::TokenCodec;
pub use error::TokenError;
pub use secret::SigningSecret;
