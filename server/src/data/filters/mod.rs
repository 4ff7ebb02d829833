//! Dynamic query translation
//!
//! Turns client filter maps into parameterized `SELECT`/`COUNT` statements
//! and partial field maps into parameterized `UPDATE` statements. Only
//! allow-listed identifiers and operator keywords are written into SQL text;
//! every client value is bound.
//!
//! ## Usage
//!
//! ```
//! use serde_json::json;
//! use leaddesk_server::data::filters::{
//!     LEADS, ListQuerySpec, OrderBy, build_list_query, parse_filters,
//! };
//!
//! let spec = json!({"status": {"in": ["new", "qualified"]}});
//! let filters = parse_filters(spec.as_object().unwrap(), &LEADS).unwrap();
//! let query = ListQuerySpec {
//!     filters,
//!     page: 1,
//!     limit: 20,
//!     order: OrderBy::default_for(&LEADS).unwrap(),
//! };
//! let stmts = build_list_query(&LEADS, &query).unwrap();
//! assert_eq!(stmts.count.sql, "SELECT COUNT(*) FROM leads WHERE \"status\" IN ($1, $2)");
//! ```

mod builder;
mod columns;
mod compiler;
mod error;
mod operator;
mod parser;
mod types;
mod update;

pub use builder::{
    DEFAULT_LIMIT, ListQuerySpec, ListResult, ListStatements, MAX_LIMIT, OrderBy, OrderDirection,
    build_list_query, parse_limit, parse_page, total_pages,
};
pub use columns::{Column, LEADS, Table, parse_timestamp};
pub use compiler::{compile, compile_conjunction};
pub use error::QueryError;
pub use operator::{Arity, Operator};
pub use parser::{MAX_FILTERS, parse_filters};
pub use types::{CompiledClause, FilterExpression, FilterValue};
pub use update::{UpdateSpec, build_update};
