//! Authentication and token issuance configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Token TTL bounds, in minutes. The upper bound is seven days.
pub const MIN_TOKEN_TTL_MINUTES: i64 = 1;
pub const MAX_TOKEN_TTL_MINUTES: i64 = 10_080;

/// Placeholder secret shipped in the default configuration. Signing with it
/// works, but startup logs a loud warning until a real secret is set.
pub const PLACEHOLDER_SECRET: &str = "please_guys_do_not_forget_to_set_a_secret_key";

/// Configuration for token issuance and the authentication gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Signing secret. Prefer setting `secret_env` instead of inlining.
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Environment variable containing the signing secret. Takes
    /// precedence over `secret` when set and non-empty.
    #[serde(default = "default_secret_env")]
    pub secret_env: Option<String>,

    /// Signature algorithm name embedded in the token header.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Access token lifetime in minutes.
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,

    /// Name of the cookie carrying the access token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// SameSite attribute for the access token cookie.
    #[serde(default)]
    pub cookie_same_site: SameSite,

    /// Paths exempt from authentication. Literal, or with a single
    /// trailing `*` matching any suffix.
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,
}

/// SameSite attribute values for the access token cookie.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

impl SameSite {
    /// The attribute value as it appears in a `Set-Cookie` header.
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

impl AuthConfig {
    /// Resolve the signing secret, checking `secret_env` first.
    pub fn resolve_secret(&self) -> String {
        if let Some(env_var) = &self.secret_env
            && let Ok(secret) = std::env::var(env_var)
            && !secret.is_empty()
        {
            return secret;
        }
        self.secret.clone()
    }

    /// Whether the resolved secret is still the shipped placeholder.
    pub fn secret_is_placeholder(&self) -> bool {
        self.resolve_secret() == PLACEHOLDER_SECRET
    }

    /// Cookie max-age derived from the token TTL, in seconds.
    pub fn cookie_max_age_seconds(&self) -> i64 {
        self.token_ttl_minutes * 60
    }

    /// Validate bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_ttl_minutes < MIN_TOKEN_TTL_MINUTES
            || self.token_ttl_minutes > MAX_TOKEN_TTL_MINUTES
        {
            return Err(ConfigError::OutOfRange {
                field: "auth.token_ttl_minutes",
                value: self.token_ttl_minutes,
                min: MIN_TOKEN_TTL_MINUTES,
                max: MAX_TOKEN_TTL_MINUTES,
            });
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            secret_env: default_secret_env(),
            algorithm: default_algorithm(),
            token_ttl_minutes: default_token_ttl_minutes(),
            cookie_name: default_cookie_name(),
            cookie_same_site: SameSite::default(),
            excluded_paths: default_excluded_paths(),
        }
    }
}

fn default_secret() -> String {
    PLACEHOLDER_SECRET.to_string()
}

fn default_secret_env() -> Option<String> {
    Some("FLIGHTDECK_SECRET_KEY".to_string())
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    60
}

fn default_cookie_name() -> String {
    "access_token".to_string()
}

fn default_excluded_paths() -> Vec<String> {
    [
        "/",
        "/docs",
        "/openapi.json",
        "/redoc",
        "/health",
        "/users/register",
        "/users/login",
        // Public flight search and listing
        "/flights/search",
        "/flights/list",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
