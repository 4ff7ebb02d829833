//! Lead repository
//!
//! Dynamic statements (list, update) are built by `data::filters`; this
//! module runs them and owns the fixed-shape insert/get/delete SQL.

use serde_json::Value;

use crate::data::error::DataError;
use crate::data::filters::{ListResult, ListStatements};
use crate::data::statement::{ColumnType, SqlValue, Statement};
use crate::data::traits::SqlStore;

/// Fields accepted when creating a lead
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub score: Option<i64>,
    pub lead_value: Option<f64>,
}

fn opt_text(v: &Option<String>) -> SqlValue {
    v.clone()
        .map(SqlValue::Text)
        .unwrap_or(SqlValue::Null(ColumnType::Text))
}

impl NewLead {
    fn to_statement(&self) -> Statement {
        Statement::new(
            "INSERT INTO leads (first_name, last_name, email, phone, company, city, state, source, status, score, lead_value) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING *",
            vec![
                self.first_name.as_str().into(),
                self.last_name.as_str().into(),
                self.email.as_str().into(),
                opt_text(&self.phone),
                opt_text(&self.company),
                opt_text(&self.city),
                opt_text(&self.state),
                opt_text(&self.source),
                opt_text(&self.status),
                self.score
                    .map(SqlValue::Integer)
                    .unwrap_or(SqlValue::Null(ColumnType::Integer)),
                self.lead_value
                    .map(SqlValue::Float)
                    .unwrap_or(SqlValue::Null(ColumnType::Float)),
            ],
        )
    }
}

pub async fn create_lead(store: &dyn SqlStore, lead: &NewLead) -> Result<Value, DataError> {
    store
        .fetch_optional(&lead.to_statement())
        .await?
        .ok_or_else(|| DataError::Decode("INSERT returned no row".into()))
}

/// Count then fetch one page. The two statements are not run in a
/// transaction, so `total` is approximate under concurrent writes.
pub async fn list_leads(
    store: &dyn SqlStore,
    stmts: &ListStatements,
    page: u32,
    limit: u32,
) -> Result<ListResult<Value>, DataError> {
    let total = store.fetch_count(&stmts.count).await?;
    let data = store.fetch_rows(&stmts.select).await?;
    Ok(ListResult::new(data, page, limit, total))
}

pub async fn get_lead(store: &dyn SqlStore, id: i64) -> Result<Option<Value>, DataError> {
    let stmt = Statement::new("SELECT * FROM leads WHERE id = $1", vec![id.into()]);
    store.fetch_optional(&stmt).await
}

/// Run a compiled `UPDATE ... RETURNING *`; `None` when no row matched
pub async fn update_lead(store: &dyn SqlStore, stmt: &Statement) -> Result<Option<Value>, DataError> {
    store.fetch_optional(stmt).await
}

/// Returns whether a row was deleted
pub async fn delete_lead(store: &dyn SqlStore, id: i64) -> Result<bool, DataError> {
    let stmt = Statement::new("DELETE FROM leads WHERE id = $1", vec![id.into()]);
    Ok(store.execute(&stmt).await? > 0)
}
