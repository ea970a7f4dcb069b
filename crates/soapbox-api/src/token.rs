use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use soapbox_types::api::Claims;

use crate::config::Settings;
use crate::error::ApiError;

/// Issues and checks the bearer tokens handed out at login.
pub struct TokenService {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, algorithm: Algorithm, ttl_minutes: i64) -> Self {
        Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.secret_key,
            settings.algorithm,
            settings.access_token_expire_minutes,
        )
    }

    pub fn issue(&self, user_id: i64) -> anyhow::Result<String> {
        let claims = Claims {
            user_id,
            exp: (Utc::now() + self.ttl).timestamp().max(0) as usize,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        Ok(token)
    }

    /// Checks signature, algorithm and expiry and returns the embedded user id.
    pub fn verify(&self, token: &str) -> Result<i64, ApiError> {
        let validation = Validation::new(self.algorithm);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims.user_id)
            .map_err(|e| {
                debug!("Rejected bearer token: {}", e);
                ApiError::InvalidToken
            })
    }
}
