//! Authentication manager

use chrono::Duration;

use super::jwt::{JwtError, SessionClaims, create_session_token, validate_session_token};
use crate::data::repositories::user::PublicUser;

/// Issues and validates session tokens with one signing key
#[derive(Debug)]
pub struct AuthManager {
    signing_key: Vec<u8>,
    session_ttl: Duration,
}

impl AuthManager {
    pub fn new(secret: &str, session_ttl_secs: u64) -> Self {
        let ttl = i64::try_from(session_ttl_secs).unwrap_or(i64::MAX);
        tracing::debug!(session_ttl_secs, "Authentication manager initialized");
        Self {
            signing_key: secret.as_bytes().to_vec(),
            session_ttl: Duration::seconds(ttl),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Sign a session token for a user
    pub fn issue_session(&self, user: &PublicUser) -> Result<String, JwtError> {
        create_session_token(&self.signing_key, user.id, &user.email, self.session_ttl)
    }

    pub fn validate_session(&self, jwt: &str) -> Result<SessionClaims, JwtError> {
        validate_session_token(jwt, &self.signing_key)
    }
}
