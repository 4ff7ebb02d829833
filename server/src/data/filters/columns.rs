//! Column allow-lists
//!
//! Only identifiers listed here can appear in generated SQL. Each column
//! declares its type so client values are coerced before binding.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::error::QueryError;
use crate::data::statement::{ColumnType, SqlValue};
use crate::utils::sql::quote_ident;

/// A column known to the query layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    pub filterable: bool,
    pub updatable: bool,
    pub sortable: bool,
}

impl Column {
    const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            nullable: true,
            filterable: true,
            updatable: true,
            sortable: true,
        }
    }

    const fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    const fn read_only(mut self) -> Self {
        self.updatable = false;
        self
    }

    /// Quoted identifier for SQL text
    pub fn quoted(&self) -> String {
        quote_ident(self.name)
    }

    /// Coerce a client-supplied JSON value into a bindable value of this column's type
    pub fn coerce(&self, raw: &Value) -> Result<SqlValue, QueryError> {
        if raw.is_null() {
            if !self.nullable {
                return Err(QueryError::invalid_value(self.name, "must not be null"));
            }
            return Ok(SqlValue::Null(self.ty));
        }

        let mismatch = || {
            QueryError::invalid_value(self.name, format!("expected {}", self.ty.as_str()))
        };

        match self.ty {
            ColumnType::Text => match raw {
                Value::String(s) => Ok(SqlValue::Text(s.clone())),
                Value::Number(n) => Ok(SqlValue::Text(n.to_string())),
                Value::Bool(b) => Ok(SqlValue::Text(b.to_string())),
                _ => Err(mismatch()),
            },
            ColumnType::Integer => match raw {
                Value::Number(n) => n.as_i64().map(SqlValue::Integer).ok_or_else(mismatch),
                Value::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map(SqlValue::Integer)
                    .map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            ColumnType::Float => {
                let v = match raw {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                v.filter(|f| f.is_finite())
                    .map(SqlValue::Float)
                    .ok_or_else(mismatch)
            }
            ColumnType::Timestamp => match raw {
                Value::String(s) => parse_timestamp(s).map(SqlValue::Timestamp).ok_or_else(|| {
                    QueryError::invalid_value(
                        self.name,
                        "expected an RFC 3339 timestamp or YYYY-MM-DD date",
                    )
                }),
                _ => Err(mismatch()),
            },
        }
    }
}

/// Parse RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD` (midnight UTC)
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A table the query layer may address
#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub primary_key: &'static str,
    /// Column stamped with `NOW()` on every update
    pub updated_at: Option<&'static str>,
    /// Default ORDER BY column (descending)
    pub default_order: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn filterable(&self, name: &str) -> Result<&'static Column, QueryError> {
        self.column(name)
            .filter(|c| c.filterable)
            .ok_or_else(|| QueryError::UnknownField(name.to_string()))
    }

    pub fn updatable(&self, name: &str) -> Result<&'static Column, QueryError> {
        match self.column(name) {
            Some(c) if c.updatable => Ok(c),
            Some(_) => Err(QueryError::ReadOnlyField(name.to_string())),
            None => Err(QueryError::UnknownField(name.to_string())),
        }
    }

    pub fn sortable(&self, name: &str) -> Result<&'static Column, QueryError> {
        self.column(name)
            .filter(|c| c.sortable)
            .ok_or_else(|| QueryError::UnsortableField(name.to_string()))
    }
}

/// The `leads` table
pub static LEADS: Table = Table {
    name: "leads",
    primary_key: "id",
    updated_at: Some("updated_at"),
    default_order: "created_at",
    columns: &[
        Column::new("id", ColumnType::Integer).required().read_only(),
        Column::new("first_name", ColumnType::Text).required(),
        Column::new("last_name", ColumnType::Text).required(),
        Column::new("email", ColumnType::Text).required(),
        Column::new("phone", ColumnType::Text),
        Column::new("company", ColumnType::Text),
        Column::new("city", ColumnType::Text),
        Column::new("state", ColumnType::Text),
        Column::new("source", ColumnType::Text),
        Column::new("status", ColumnType::Text),
        Column::new("score", ColumnType::Integer),
        Column::new("lead_value", ColumnType::Float),
        Column::new("created_at", ColumnType::Timestamp).required().read_only(),
        Column::new("updated_at", ColumnType::Timestamp).required().read_only(),
    ],
};
