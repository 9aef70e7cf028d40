use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TTL_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum MagicLinkError {
    /// Covers malformed, forged, and expired tokens alike; callers must
    /// not learn which check failed.
    #[error("magic link token is invalid")]
    Invalid,
    #[error("failed to sign magic link token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicLinkPayload {
    pub email: String,
    pub results_token: String,
    pub iat: i64,
    pub exp: i64,
}

/// Stateless issuer and verifier for magic-link tokens. Holds the signing
/// secret handed in at construction; never reads the environment itself.
pub struct MagicLinkService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl MagicLinkService {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn create(
        &self,
        email: &str,
        results_token: &str,
        ttl: Duration,
    ) -> Result<String, MagicLinkError> {
        let issued_at = Utc::now();
        let payload = MagicLinkPayload {
            email: email.to_string(),
            results_token: results_token.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)
            .map_err(MagicLinkError::Signing)
    }

    pub fn verify(&self, token: &str) -> Result<MagicLinkPayload, MagicLinkError> {
        decode::<MagicLinkPayload>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| MagicLinkError::Invalid)
    }
}

/// Shape check only: three non-empty base64url segments separated by dots.
/// Accepts forged and expired tokens; never a substitute for `verify`.
pub fn looks_like_token(value: &str) -> bool {
    let segments: Vec<&str> = value.split('.').collect();
    segments.len() == 3
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        })
}
