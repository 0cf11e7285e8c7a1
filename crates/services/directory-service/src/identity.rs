//! Identity tokens from the phone verification provider.
//!
//! The provider signs an HS256 JWT once a one-time code has been confirmed.
//! The directory only verifies it and reads the phone number.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use common::{AppError, AppResult, IdentityConfig};
use domain::{is_valid_phone, normalize_phone};

/// Identity token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Provider-side account id
    pub sub: String,
    pub phone_number: String,
    pub iat: i64,
    pub exp: i64,
}

/// A caller whose phone number has been verified.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedIdentity {
    pub subject: String,
    /// Canonical `+84xxxxxxxxx` form
    pub phone_number: String,
}

pub struct IdentityVerifier {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn new(config: &IdentityConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(config.token_secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(config.token_secret.as_bytes()),
            validation,
        }
    }

    /// Check signature and expiry, then normalize the phone number.
    pub fn verify(&self, token: &str) -> AppResult<VerifiedIdentity> {
        let claims = decode::<IdentityClaims>(token, &self.decoding_key, &self.validation)?.claims;

        let phone_number = normalize_phone(&claims.phone_number);
        if !is_valid_phone(&phone_number) {
            tracing::warn!(subject = %claims.sub, "Identity token carries a malformed phone number");
            return Err(AppError::Unauthorized);
        }

        Ok(VerifiedIdentity {
            subject: claims.sub,
            phone_number,
        })
    }

    /// Sign a token with the shared secret, for local development and tests.
    pub fn issue(&self, subject: &str, phone_number: &str, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = IdentityClaims {
            sub: subject.to_string(),
            phone_number: phone_number.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }
}
