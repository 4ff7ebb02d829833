//! Data storage layer
//!
//! - `filters` - Translation of client filter/update maps into parameterized SQL
//! - `statement` - SQL text plus typed positional parameters
//! - `traits` - The `SqlStore` seam between query building and execution
//! - `postgres` - PostgreSQL pool, schema and `SqlStore` implementation
//! - `repositories` - Lead and user persistence over any `SqlStore`
//! - `error` - Data layer error type

pub mod error;
pub mod filters;
pub mod postgres;
pub mod repositories;
pub mod statement;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ConstraintKind, DataError};
pub use postgres::PostgresService;
pub use statement::{ColumnType, SqlValue, Statement};
pub use traits::SqlStore;
