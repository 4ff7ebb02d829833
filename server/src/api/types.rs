//! Shared API types
//!
//! Error responses shared by every endpoint. All errors render as
//! `{ "error": <kind>, "code": <CODE>, "message": <text> }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::filters::QueryError;
use crate::data::{ConstraintKind, DataError};

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    Unauthorized { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unauthorized {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Map a store error. Constraint violations are client errors; anything
    /// else is logged and hidden behind a generic 500.
    pub fn from_data(e: DataError) -> Self {
        match e.constraint_violation() {
            Some(ConstraintKind::Unique) => {
                Self::bad_request("ALREADY_EXISTS", "Record already exists.")
            }
            Some(ConstraintKind::NotNull | ConstraintKind::Check) => {
                tracing::debug!(error = %e, "Constraint violation");
                Self::bad_request("INVALID_VALUE", "A field value violates a table constraint.")
            }
            None if e.is_transient() => {
                tracing::warn!(error = %e, "Database unavailable");
                Self::service_unavailable("Database temporarily unavailable")
            }
            None => {
                tracing::error!(error = %e, "Data error");
                Self::internal("Database operation failed")
            }
        }
    }

    /// Like [`from_data`](Self::from_data) with a route-specific duplicate message
    pub fn from_write(e: DataError, duplicate_message: &str) -> Self {
        if e.is_unique_violation() {
            return Self::bad_request("ALREADY_EXISTS", duplicate_message);
        }
        Self::from_data(e)
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        Self::bad_request(e.code(), e.to_string())
    }
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        Self::from_data(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, "unauthorized", code, message)
            }
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
