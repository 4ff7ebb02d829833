//! Filter value objects

use serde_json::Value;

use super::columns::Column;
use super::operator::Operator;
use crate::data::statement::SqlValue;

/// Raw client value attached to an operator
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl From<Value> for FilterValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items),
            other => Self::Scalar(other),
        }
    }
}

/// One validated `field operator value` triple
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    pub column: &'static Column,
    pub operator: Operator,
    pub value: FilterValue,
}

/// SQL fragment plus the values bound to its placeholders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledClause {
    pub sql: String,
    pub params: Vec<SqlValue>,
}
