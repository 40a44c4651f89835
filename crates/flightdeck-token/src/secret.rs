//! Signing-secret resolution.

use flightdeck_core::config::AuthConfig;

/// The process-wide signing secret.
///
/// Read-only after construction and safe to share across concurrent
/// verifications. The raw bytes are intentionally not printable via
/// `Debug`.
pub struct SigningSecret {
    bytes: Vec<u8>,
    placeholder: bool,
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecret")
            .field("placeholder", &self.placeholder)
            .finish_non_exhaustive()
    }
}

impl SigningSecret {
    /// Resolve the secret from configuration (environment first).
    ///
    /// A missing secret must not silently behave as configured: when the
    /// resolved value is still the shipped placeholder, a loud warning is
    /// emitted and `is_placeholder` reports it for startup checks.
    pub fn from_config(config: &AuthConfig) -> Self {
        let resolved = config.resolve_secret();
        let placeholder = config.secret_is_placeholder();
        if placeholder {
            tracing::warn!(
                "no signing secret configured; tokens are signed with the insecure \
                 placeholder default. Set FLIGHTDECK_SECRET_KEY before deploying."
            );
        }
        Self {
            bytes: resolved.into_bytes(),
            placeholder,
        }
    }

    /// Build from raw bytes (tests, embedded deployments).
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            placeholder: false,
        }
    }

    /// The key material.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether the secret is the shipped placeholder default.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}
