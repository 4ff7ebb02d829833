//! Authentication API endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::auth::password::{hash_password_async, verify_password_async};
use crate::api::auth::{AuthManager, AuthState, PasswordError, SessionUser, require_auth};
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::core::constants::SESSION_COOKIE_NAME;
use crate::data::SqlStore;
use crate::data::repositories::user::{self, PublicUser};

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

#[derive(Debug, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and password are required."))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Auth routes state
#[derive(Clone)]
pub struct AuthRoutesState {
    pub auth_manager: Arc<AuthManager>,
    pub store: Arc<dyn SqlStore>,
}

/// Create auth routes; `/me` sits behind the session middleware
pub fn routes(auth_manager: Arc<AuthManager>, store: Arc<dyn SqlStore>) -> Router {
    let me = Router::new()
        .route("/me", get(me))
        .layer(axum::middleware::from_fn_with_state(
            AuthState {
                auth_manager: auth_manager.clone(),
            },
            require_auth,
        ));

    let state = AuthRoutesState {
        auth_manager,
        store,
    };

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .with_state(state)
        .merge(me)
}

fn password_failure(e: PasswordError) -> ApiError {
    tracing::error!(error = %e, "Password hashing failed");
    ApiError::internal("Server error during authentication.")
}

/// Create an account
pub async fn register(
    State(state): State<AuthRoutesState>,
    ValidatedJson(request): ValidatedJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let hash = hash_password_async(request.password)
        .await
        .map_err(password_failure)?;

    let created = user::create_user(state.store.as_ref(), &request.email, &hash)
        .await
        .map_err(|e| ApiError::from_write(e, "Email already in use."))?;

    tracing::info!(user_id = created.id, "User registered");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Verify credentials and set the session cookie
pub async fn login(
    State(state): State<AuthRoutesState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<CredentialsRequest>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let invalid = || ApiError::unauthorized("INVALID_CREDENTIALS", INVALID_CREDENTIALS);

    let Some(row) = user::get_by_email(state.store.as_ref(), &request.email).await? else {
        return Err(invalid());
    };

    let matches = match verify_password_async(request.password, row.password_hash.clone()).await {
        Ok(matches) => matches,
        Err(PasswordError::MalformedHash) => {
            tracing::warn!(user_id = row.id, "Stored password hash is malformed");
            false
        }
        Err(e) => return Err(password_failure(e)),
    };
    if !matches {
        return Err(invalid());
    }

    let user = PublicUser::from(row);
    let token = state.auth_manager.issue_session(&user).map_err(|e| {
        tracing::error!(error = %e, "Failed to sign session token");
        ApiError::internal("Server error during login.")
    })?;

    let max_age = time::Duration::seconds(state.auth_manager.session_ttl().num_seconds());
    let cookie = Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .max_age(max_age)
        .build();

    tracing::debug!(user_id = user.id, "Session issued");
    Ok((
        jar.add(cookie),
        Json(MessageResponse {
            message: "Logged in successfully.",
        }),
    ))
}

/// Current session identity
pub async fn me(user: SessionUser) -> Json<SessionUser> {
    Json(user)
}

/// Clear the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    let cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .path("/")
        .build();

    (
        jar.remove(cookie),
        Json(MessageResponse {
            message: "Logged out successfully.",
        }),
    )
}
