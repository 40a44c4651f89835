//! Claims carried inside an access token.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Claims embedded in an access token.
///
/// `exp` and `iat` are unix timestamps in milliseconds. Expiry has no
/// leeway: a token is invalid from the instant `exp` itself onward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (the user's email).
    pub sub: String,

    /// Expiration time, unix milliseconds.
    pub exp: i64,

    /// Issued-at time, unix milliseconds.
    pub iat: i64,
}

impl AccessClaims {
    /// Build claims for a subject issued at `issued_at`, valid for `ttl`.
    pub fn new(subject: impl Into<String>, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: subject.into(),
            exp: (issued_at + ttl).timestamp_millis(),
            iat: issued_at.timestamp_millis(),
        }
    }

    /// The expiration instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.exp).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Whether the claims are expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.exp
    }
}
