//! Authentication middleware

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use serde::Serialize;
use serde_json::json;

use super::jwt::JwtError;
use super::manager::AuthManager;
use crate::core::constants::SESSION_COOKIE_NAME;

/// Authentication error response
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    pub fn required() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "AUTH_REQUIRED",
            message: "Authentication required".to_string(),
        }
    }

    pub fn expired() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "TOKEN_EXPIRED",
            message: "Session has expired".to_string(),
        }
    }

    pub fn invalid() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "TOKEN_INVALID",
            message: "Invalid session token".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": "unauthorized",
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Shared auth state for middleware
#[derive(Clone)]
pub struct AuthState {
    pub auth_manager: Arc<AuthManager>,
}

/// Identity of the caller, taken from a validated session cookie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub email: String,
}

/// Require a valid `token` cookie; injects [`SessionUser`] into request extensions
pub async fn require_auth(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let cookie = jar.get(SESSION_COOKIE_NAME).ok_or_else(AuthError::required)?;
    if cookie.value().is_empty() {
        return Err(AuthError::required());
    }

    let claims = state
        .auth_manager
        .validate_session(cookie.value())
        .map_err(|e| {
            tracing::debug!(error = %e, "Session rejected");
            match e {
                JwtError::Expired => AuthError::expired(),
                _ => AuthError::invalid(),
            }
        })?;

    request.extensions_mut().insert(SessionUser {
        id: claims.user_id(),
        email: claims.email,
    });

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .ok_or_else(AuthError::required)
    }
}
