//! Store trait
//!
//! The query layer only produces [`Statement`]s; anything that can run them
//! implements [`SqlStore`]. Rows come back as JSON objects keyed by column.

use async_trait::async_trait;
use serde_json::Value;

use crate::data::error::DataError;
use crate::data::statement::Statement;

#[async_trait]
pub trait SqlStore: Send + Sync {
    /// Run a row-returning statement (`SELECT` or `... RETURNING`)
    async fn fetch_rows(&self, stmt: &Statement) -> Result<Vec<Value>, DataError>;

    /// Run a statement returning a single count column
    async fn fetch_count(&self, stmt: &Statement) -> Result<u64, DataError>;

    /// Run a statement and return the number of rows affected
    async fn execute(&self, stmt: &Statement) -> Result<u64, DataError>;

    /// First row of a row-returning statement
    async fn fetch_optional(&self, stmt: &Statement) -> Result<Option<Value>, DataError> {
        Ok(self.fetch_rows(stmt).await?.into_iter().next())
    }
}
