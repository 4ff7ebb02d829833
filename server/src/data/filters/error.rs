//! Query translation errors
//!
//! Every variant is a client input problem and maps to a 400 response.
//! None of them is produced after SQL has been sent to the store.

use thiserror::Error;

use super::operator::Operator;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field cannot be updated: {0}")]
    ReadOnlyField(String),

    #[error("Cannot order by: {0}")]
    UnsortableField(String),

    #[error("Invalid order_by format. Use 'column', 'column:asc' or 'column:desc'")]
    InvalidOrder,

    #[error("Unknown operator '{operator}' for field {field}")]
    UnknownOperator { field: String, operator: String },

    #[error("Filter on field {0} must be of the form filter[{0}][operator]=value")]
    MalformedFilter(String),

    #[error("Operator '{operator}' is not supported on field {field}")]
    UnsupportedOperator { field: String, operator: Operator },

    #[error("Operator '{operator}' on field {field} expects a single value")]
    ExpectedScalar { field: String, operator: Operator },

    #[error("Operator 'in' on field {0} requires at least one value")]
    EmptyInList(String),

    #[error("Operator 'between' on field {field} requires exactly two comma-separated bounds, got {parts}")]
    BetweenArity { field: String, parts: usize },

    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Maximum {0} filters allowed")]
    TooManyFilters(usize),

    #[error("No fields to update provided.")]
    EmptyUpdate,
}

impl QueryError {
    pub(crate) fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownField(_) => "INVALID_FILTER_COLUMN",
            Self::ReadOnlyField(_) => "READ_ONLY_FIELD",
            Self::UnsortableField(_) => "INVALID_ORDER_COLUMN",
            Self::InvalidOrder => "INVALID_ORDER",
            Self::UnknownOperator { .. } => "UNKNOWN_OPERATOR",
            Self::MalformedFilter(_) => "MALFORMED_FILTER",
            Self::UnsupportedOperator { .. } => "UNSUPPORTED_OPERATOR",
            Self::ExpectedScalar { .. } | Self::EmptyInList(_) | Self::BetweenArity { .. } => {
                "INVALID_FILTER_ARITY"
            }
            Self::InvalidValue { .. } => "INVALID_VALUE",
            Self::TooManyFilters(_) => "TOO_MANY_FILTERS",
            Self::EmptyUpdate => "EMPTY_UPDATE",
        }
    }
}
