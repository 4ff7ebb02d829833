//! Lead API endpoints
//!
//! List and update take client-shaped input (filter maps, partial field
//! maps) and go through `data::filters`; everything else is fixed SQL.

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Map, Value};

use crate::api::extractors::{ApiJson, LeadPath, ListQuery, ValidatedJson};
use crate::api::types::ApiError;
use crate::data::SqlStore;
use crate::data::filters::{LEADS, ListResult, UpdateSpec, build_list_query, build_update};
use crate::data::repositories::lead;

use types::CreateLeadRequest;

const DUPLICATE_EMAIL: &str = "Email already exists for a lead.";

/// Shared state for lead endpoints
#[derive(Clone)]
pub struct LeadsApiState {
    pub store: Arc<dyn SqlStore>,
}

/// Build lead routes (mounted behind `require_auth`)
pub fn routes(store: Arc<dyn SqlStore>) -> Router<()> {
    let state = LeadsApiState { store };

    Router::new()
        .route("/", get(list_leads).post(create_lead))
        .route("/{id}", get(get_lead).put(update_lead).delete(delete_lead))
        .with_state(state)
}

fn lead_not_found() -> ApiError {
    ApiError::not_found("LEAD_NOT_FOUND", "Lead not found.")
}

pub async fn create_lead(
    State(state): State<LeadsApiState>,
    ValidatedJson(request): ValidatedJson<CreateLeadRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let row = lead::create_lead(state.store.as_ref(), &request.into())
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_EMAIL))?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// Filtered, sorted, paginated list
pub async fn list_leads(
    State(state): State<LeadsApiState>,
    query: ListQuery,
) -> Result<Json<ListResult<Value>>, ApiError> {
    let spec = query.into_spec(&LEADS)?;
    let stmts = build_list_query(&LEADS, &spec)?;

    tracing::debug!(
        filters = spec.filters.len(),
        page = spec.page,
        limit = spec.limit,
        "Listing leads"
    );

    let result = lead::list_leads(state.store.as_ref(), &stmts, spec.page, spec.limit).await?;
    Ok(Json(result))
}

pub async fn get_lead(
    State(state): State<LeadsApiState>,
    path: LeadPath,
) -> Result<Json<Value>, ApiError> {
    lead::get_lead(state.store.as_ref(), path.id)
        .await?
        .map(Json)
        .ok_or_else(lead_not_found)
}

/// Partial update; only allow-listed columns may appear in the body
pub async fn update_lead(
    State(state): State<LeadsApiState>,
    path: LeadPath,
    ApiJson(fields): ApiJson<Map<String, Value>>,
) -> Result<Json<Value>, ApiError> {
    let spec = UpdateSpec::from_map(path.id, &fields, &LEADS)?;
    let stmt = build_update(&LEADS, &spec)?;

    lead::update_lead(state.store.as_ref(), &stmt)
        .await
        .map_err(|e| ApiError::from_write(e, DUPLICATE_EMAIL))?
        .map(Json)
        .ok_or_else(lead_not_found)
}

pub async fn delete_lead(
    State(state): State<LeadsApiState>,
    path: LeadPath,
) -> Result<StatusCode, ApiError> {
    if lead::delete_lead(state.store.as_ref(), path.id).await? {
        tracing::debug!(id = path.id, "Lead deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(lead_not_found())
    }
}
