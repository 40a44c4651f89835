//! Error types for token handling.

use thiserror::Error;

/// Errors that can occur during token operations.
///
/// The gate collapses every verification variant into one uniform 401;
/// the distinctions below exist for internal logging only.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token does not have the expected three-segment structure, or a
    /// segment fails to decode.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Signature does not match the signed segments.
    #[error("token signature mismatch")]
    InvalidSignature,

    /// The header names an algorithm this codec does not sign with.
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The token's expiry is in the past.
    #[error("token expired at {expired_at}")]
    Expired { expired_at: String },

    /// Failed to serialize claims while issuing.
    #[error("token serialization error: {0}")]
    SerializationError(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
