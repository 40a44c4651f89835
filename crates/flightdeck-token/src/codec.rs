//! Token encoding and verification.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::claims::AccessClaims;
use crate::clock::Clock;
use crate::error::TokenError;
use crate::secret::SigningSecret;

type HmacSha256 = Hmac<Sha256>;

/// The only algorithm this codec signs or accepts.
pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Stateless encoder/verifier for access tokens.
///
/// Issued tokens are `base64url(header).base64url(claims).base64url(sig)`
/// where `sig` is HMAC-SHA256 over the first two segments. The codec holds
/// the process-wide secret (read-only) and a clock handle, so issuance is a
/// pure function of clock + secret.
pub struct TokenCodec {
    secret: SigningSecret,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec for the given secret and clock.
    ///
    /// `algorithm` comes from configuration; anything other than `HS256`
    /// is rejected up front rather than silently signing differently.
    pub fn new(
        secret: SigningSecret,
        algorithm: &str,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        if algorithm != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(algorithm.to_string()));
        }
        Ok(Self { secret, clock })
    }

    /// Issue a signed token for `subject`, valid for `ttl` from now.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };
        let claims = AccessClaims::new(subject, self.clock.now(), ttl);

        let header_b64 = encode_segment(&header)?;
        let claims_b64 = encode_segment(&claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = self.sign(signing_input.as_bytes())?;
        let signature_b64 = URL_SAFE_NO_PAD.encode(signature);

        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Verify a token and return its subject.
    ///
    /// Rejects malformed structure, an unexpected algorithm header, a
    /// signature mismatch, and expiry. Expiry has zero leeway: a token
    /// expiring at `T` is already invalid at `T`.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let mut segments = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => {
                    return Err(TokenError::Malformed(
                        "expected three dot-separated segments".to_string(),
                    ));
                }
            };

        // Signature first: nothing inside an unauthenticated token is
        // trusted, including its header.
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|e| TokenError::Malformed(format!("signature segment: {e}")))?;
        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let header: Header = decode_segment(header_b64, "header")?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(header.alg));
        }

        let claims: AccessClaims = decode_segment(claims_b64, "claims")?;
        if claims.is_expired(self.clock.now()) {
            return Err(TokenError::Expired {
                expired_at: claims.expires_at().to_rfc3339(),
            });
        }

        Ok(claims.sub)
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| TokenError::Internal(anyhow::anyhow!("hmac key setup: {e}")))
    }

    fn sign(&self, input: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = self.mac()?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn encode_segment<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)
        .map_err(|e| TokenError::SerializationError(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

fn decode_segment<T: for<'de> Deserialize<'de>>(
    segment: &str,
    what: &str,
) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| TokenError::Malformed(format!("{what} segment: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Malformed(format!("{what} segment: {e}")))
}
