//! Authentication module
//!
//! Argon2id password hashes, HS256 session tokens carried in an HttpOnly
//! cookie, and the middleware that guards the lead routes.

pub mod jwt;
mod manager;
pub mod middleware;
pub mod password;

pub use jwt::{JwtError, SessionClaims};
pub use manager::AuthManager;
pub use middleware::{AuthError, AuthState, SessionUser, require_auth};
pub use password::PasswordError;
