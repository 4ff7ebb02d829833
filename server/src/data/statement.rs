//! Parameterized SQL statements
//!
//! A [`Statement`] is SQL text with `$n` placeholders plus the ordered values
//! bound to them. Every statement the service issues goes through this type.

use chrono::{DateTime, Utc};

/// Declared storage type of a column; drives value coercion and NULL binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Timestamp,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "number",
            Self::Timestamp => "timestamp",
        }
    }
}

/// A typed value bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    /// NULL carries its column type so the driver can bind a typed null
    Null(ColumnType),
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

/// SQL text plus its positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Count `$n` positional markers in SQL text
pub fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|&(i, &b)| b == b'$' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit))
        .count()
}
