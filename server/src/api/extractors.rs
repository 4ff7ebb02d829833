//! Path, query and body extractors for API routes
//!
//! All rejections render the same `{error, code, message}` body as
//! [`ApiError`](crate::api::types::ApiError).

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::form_urlencoded;
use validator::Validate;

use crate::data::filters::{
    ListQuerySpec, OrderBy, QueryError, Table, parse_filters, parse_limit, parse_page,
};

/// Validated `/leads/{id}` path extractor
#[derive(Debug, Clone, Copy)]
pub struct LeadPath {
    pub id: i64,
}

impl<S> FromRequestParts<S> for LeadPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(Self { id }),
            _ => Err(ValidationRejection::InvalidLeadId),
        }
    }
}

/// List endpoint query parameters.
///
/// Decodes `filter[<field>][<op>]=<value>` into a nested map. A repeated key,
/// or a trailing `[]`/`[<n>]` segment, yields a list value. `page`, `limit`
/// and `order_by` are kept raw; the last occurrence wins.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: Map<String, Value>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub order_by: Option<String>,
}

impl ListQuery {
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let mut out = Self::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => out.page = Some(value.into_owned()),
                "limit" => out.limit = Some(value.into_owned()),
                "order_by" => out.order_by = Some(value.into_owned()),
                k if k == "filter" || k.starts_with("filter[") => {
                    out.insert_filter(k, &k["filter".len()..], value.into_owned())?;
                }
                _ => {}
            }
        }

        Ok(out)
    }

    fn insert_filter(&mut self, key: &str, rest: &str, value: String) -> Result<(), QueryError> {
        let malformed = || QueryError::MalformedFilter(key.to_string());
        let segments = bracket_segments(rest).ok_or_else(malformed)?;

        let (field, op, list) = match segments.as_slice() {
            [field, op] => (*field, *op, false),
            [field, op, idx] if idx.is_empty() || idx.bytes().all(|b| b.is_ascii_digit()) => {
                (*field, *op, true)
            }
            [field] if !field.is_empty() => return Err(QueryError::MalformedFilter(field.to_string())),
            _ => return Err(malformed()),
        };
        if field.is_empty() || op.is_empty() {
            return Err(malformed());
        }

        let ops = self
            .filter
            .entry(field.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(ops) = ops else {
            return Err(malformed());
        };

        let value = Value::String(value);
        match ops.get_mut(op) {
            None if list => {
                ops.insert(op.to_string(), Value::Array(vec![value]));
            }
            None => {
                ops.insert(op.to_string(), value);
            }
            Some(Value::Array(items)) => items.push(value),
            Some(prev) => {
                let first = prev.take();
                *prev = Value::Array(vec![first, value]);
            }
        }
        Ok(())
    }

    /// Validate against a table's allow-lists
    pub fn into_spec(self, table: &'static Table) -> Result<ListQuerySpec, QueryError> {
        let filters = parse_filters(&self.filter, table)?;
        let order = match self.order_by.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => OrderBy::parse(s, table)?,
            _ => OrderBy::default_for(table)?,
        };
        Ok(ListQuerySpec {
            filters,
            page: parse_page(self.page.as_deref()),
            limit: parse_limit(self.limit.as_deref()),
            order,
        })
    }
}

/// Split `[a][b][c]` into `["a", "b", "c"]`; `None` on anything else
fn bracket_segments(s: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    (!segments.is_empty()).then_some(segments)
}

impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::parse(parts.uri.query().unwrap_or_default()).map_err(ValidationRejection::Filter)
    }
}

/// Validation rejection with structured error response
#[derive(Debug)]
pub enum ValidationRejection {
    /// Failed to parse path parameters
    Path(PathRejection),
    /// Lead id is not a positive integer
    InvalidLeadId,
    /// Malformed filter query
    Filter(QueryError),
    /// Failed to parse JSON body
    Json(JsonRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            Self::Path(rejection) => ("PATH_PARSE_ERROR", rejection.body_text()),
            Self::InvalidLeadId => (
                "INVALID_LEAD_ID",
                "Invalid lead id: must be a positive integer".to_string(),
            ),
            Self::Filter(e) => (e.code(), e.to_string()),
            Self::Json(rejection) => ("JSON_PARSE_ERROR", rejection.body_text()),
            Self::Validation(errors) => ("VALIDATION_ERROR", format_validation_errors(&errors)),
        };
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect();
    messages.sort();
    messages.dedup();
    messages.join("; ")
}

/// JSON body extractor with automatic validation.
///
/// Deserializes JSON body and validates it using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

/// JSON body extractor without validation; rejections use the API error shape
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        Ok(Self(value))
    }
}
