//! JWT session token handling

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT creation or validation error
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Session token has expired")]
    Expired,
    #[error("Invalid session token signature")]
    InvalidSignature,
    #[error("Invalid session token: {0}")]
    Invalid(String),
    #[error("Failed to create session token: {0}")]
    Encode(String),
}

/// JWT claims for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User ID
    pub sub: i64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl SessionClaims {
    pub fn new(user_id: i64, email: &str, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.sub
    }
}

/// Create a signed HS256 session token
pub fn create_session_token(
    signing_key: &[u8],
    user_id: i64,
    email: &str,
    ttl: Duration,
) -> Result<String, JwtError> {
    let claims = SessionClaims::new(user_id, email, ttl);
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .map_err(|e| JwtError::Encode(e.to_string()))
}

/// Validate and decode a session token
pub fn validate_session_token(token: &str, signing_key: &[u8]) -> Result<SessionClaims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data =
        decode::<SessionClaims>(token, &DecodingKey::from_secret(signing_key), &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::Invalid(e.to_string()),
            })?;

    Ok(token_data.claims)
}
