//! List query assembly
//!
//! Builds a `COUNT(*)` and a paged `SELECT` from the same compiled WHERE
//! clause. The two statements run one after the other without a
//! transaction, so `total` can drift from `data` under concurrent writes.

use serde::Serialize;

use super::columns::{Column, Table};
use super::compiler::compile_conjunction;
use super::error::QueryError;
use super::types::FilterExpression;
use crate::data::statement::{SqlValue, Statement};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

/// Page number from a raw query value; absent, non-numeric or < 1 gives 1
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|&p| p >= 1)
        .map(|p| p.min(u32::MAX as i64) as u32)
        .unwrap_or(DEFAULT_PAGE)
}

/// Page size from a raw query value, clamped to `1..=MAX_LIMIT`
pub fn parse_limit(raw: Option<&str>) -> u32 {
    match raw.and_then(|s| s.trim().parse::<i64>().ok()) {
        Some(l) => l.clamp(1, MAX_LIMIT as i64) as u32,
        None => DEFAULT_LIMIT,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Desc,
    Asc,
}

impl OrderDirection {
    fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Sort column and direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderBy {
    pub column: &'static Column,
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Parse `column`, `column:asc` or `column:desc`
    pub fn parse(s: &str, table: &'static Table) -> Result<Self, QueryError> {
        let parts: Vec<&str> = s.split(':').collect();
        let (name, direction) = match parts.as_slice() {
            [col] => (*col, OrderDirection::Desc),
            [col, "asc"] => (*col, OrderDirection::Asc),
            [col, "desc"] => (*col, OrderDirection::Desc),
            _ => return Err(QueryError::InvalidOrder),
        };
        Ok(Self {
            column: table.sortable(name)?,
            direction,
        })
    }

    /// The table's default order, newest first
    pub fn default_for(table: &'static Table) -> Result<Self, QueryError> {
        Ok(Self {
            column: table.sortable(table.default_order)?,
            direction: OrderDirection::Desc,
        })
    }

    pub fn to_sql(&self) -> String {
        format!("{} {}", self.column.quoted(), self.direction.as_sql())
    }
}

/// Validated list request
#[derive(Debug, Clone)]
pub struct ListQuerySpec {
    pub filters: Vec<FilterExpression>,
    pub page: u32,
    pub limit: u32,
    pub order: OrderBy,
}

impl ListQuerySpec {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Statements for one list request
#[derive(Debug, Clone, PartialEq)]
pub struct ListStatements {
    pub count: Statement,
    pub select: Statement,
}

/// Build the count and page statements for a list request
pub fn build_list_query(
    table: &'static Table,
    spec: &ListQuerySpec,
) -> Result<ListStatements, QueryError> {
    let (clause, next) = compile_conjunction(&spec.filters, 0)?;
    let (where_sql, params) = match clause {
        Some(c) => (format!(" WHERE {}", c.sql), c.params),
        None => (String::new(), Vec::new()),
    };

    let count = Statement::new(
        format!("SELECT COUNT(*) FROM {}{where_sql}", table.name),
        params.clone(),
    );

    let mut select_params = params;
    select_params.push(SqlValue::Integer(i64::from(spec.limit)));
    select_params.push(SqlValue::Integer(
        i64::try_from(spec.offset()).unwrap_or(i64::MAX),
    ));
    let select = Statement::new(
        format!(
            "SELECT * FROM {}{where_sql} ORDER BY {} LIMIT ${} OFFSET ${}",
            table.name,
            spec.order.to_sql(),
            next + 1,
            next + 2
        ),
        select_params,
    );

    Ok(ListStatements { count, select })
}

/// Paginated list envelope
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> ListResult<T> {
    pub fn new(data: Vec<T>, page: u32, limit: u32, total: u64) -> Self {
        Self {
            data,
            page,
            limit,
            total,
            total_pages: total_pages(total, limit),
        }
    }
}

pub fn total_pages(total: u64, limit: u32) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(u64::from(limit))
}
