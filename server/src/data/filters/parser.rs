//! Filter parsing
//!
//! Turns the nested `field -> operator -> value` mapping into validated
//! [`FilterExpression`]s. Field and operator names are resolved against the
//! allow-list here, so nothing unknown reaches the compiler.

use serde_json::{Map, Value};

use super::columns::Table;
use super::error::QueryError;
use super::operator::Operator;
use super::types::{FilterExpression, FilterValue};

/// Maximum number of filter expressions per request
pub const MAX_FILTERS: usize = 50;

/// Parse a filter mapping, preserving field and operator order
pub fn parse_filters(
    spec: &Map<String, Value>,
    table: &'static Table,
) -> Result<Vec<FilterExpression>, QueryError> {
    let mut filters = Vec::new();

    for (field, ops) in spec {
        let column = table.filterable(field)?;
        let ops = match ops {
            Value::Object(ops) if !ops.is_empty() => ops,
            _ => return Err(QueryError::MalformedFilter(field.clone())),
        };

        for (name, value) in ops {
            let operator = Operator::parse(name).ok_or_else(|| QueryError::UnknownOperator {
                field: field.clone(),
                operator: name.clone(),
            })?;

            filters.push(FilterExpression {
                column,
                operator,
                value: FilterValue::from(value.clone()),
            });

            if filters.len() > MAX_FILTERS {
                return Err(QueryError::TooManyFilters(MAX_FILTERS));
            }
        }
    }

    Ok(filters)
}
