//! Clause compilation
//!
//! `compile` is pure: an expression plus the count of placeholders already
//! used yields a fragment and the new count. Placeholders are numbered from
//! `offset + 1`, so fragments compiled in sequence never collide.

use serde_json::Value;

use super::columns::Column;
use super::error::QueryError;
use super::operator::{Arity, Operator};
use super::types::{CompiledClause, FilterExpression, FilterValue};
use crate::data::statement::{ColumnType, SqlValue};
use crate::utils::sql::escape_like_pattern;

/// Compile one filter expression starting after `offset` used placeholders
pub fn compile(
    expr: &FilterExpression,
    offset: usize,
) -> Result<(CompiledClause, usize), QueryError> {
    let column = expr.column;
    let ident = column.quoted();
    let op = expr.operator;

    let (sql, params) = match op.arity() {
        Arity::One => {
            let raw = scalar(expr)?;
            let n = offset + 1;
            match op {
                Operator::Contains => {
                    if column.ty != ColumnType::Text {
                        return Err(unsupported(column, op));
                    }
                    let text = match bind(column, raw)? {
                        SqlValue::Text(s) => s,
                        _ => return Err(QueryError::invalid_value(column.name, "expected text")),
                    };
                    let pattern = format!("%{}%", escape_like_pattern(&text));
                    (
                        format!("{ident} {} ${n}", op.keyword()),
                        vec![SqlValue::Text(pattern)],
                    )
                }
                Operator::On => {
                    if column.ty != ColumnType::Timestamp {
                        return Err(unsupported(column, op));
                    }
                    (
                        format!("DATE_TRUNC('day', {ident}) {} ${n}", op.keyword()),
                        vec![bind(column, raw)?],
                    )
                }
                _ => (
                    format!("{ident} {} ${n}", op.keyword()),
                    vec![bind(column, raw)?],
                ),
            }
        }
        Arity::Two => {
            let (low, high) = between_bounds(expr)?;
            let n = offset + 1;
            (
                format!("{ident} {} ${n} AND ${}", op.keyword(), n + 1),
                vec![bind(column, &low)?, bind(column, &high)?],
            )
        }
        Arity::Many => {
            let items: Vec<&Value> = match &expr.value {
                FilterValue::Scalar(v) => vec![v],
                FilterValue::List(items) => items.iter().collect(),
            };
            if items.is_empty() {
                return Err(QueryError::EmptyInList(column.name.to_string()));
            }
            let params = items
                .into_iter()
                .map(|v| bind(column, v))
                .collect::<Result<Vec<_>, _>>()?;
            let markers = (offset + 1..=offset + params.len())
                .map(|i| format!("${i}"))
                .collect::<Vec<_>>()
                .join(", ");
            (format!("{ident} {} ({markers})", op.keyword()), params)
        }
    };

    let next = offset + params.len();
    Ok((CompiledClause { sql, params }, next))
}

/// Compile all filters with one running counter and AND-join the fragments.
/// Returns `None` for the SQL when there are no filters.
pub fn compile_conjunction(
    filters: &[FilterExpression],
    offset: usize,
) -> Result<(Option<CompiledClause>, usize), QueryError> {
    if filters.is_empty() {
        return Ok((None, offset));
    }

    let mut fragments = Vec::with_capacity(filters.len());
    let mut params = Vec::new();
    let mut next = offset;

    for expr in filters {
        let (clause, after) = compile(expr, next)?;
        fragments.push(clause.sql);
        params.extend(clause.params);
        next = after;
    }

    Ok((
        Some(CompiledClause {
            sql: fragments.join(" AND "),
            params,
        }),
        next,
    ))
}

fn scalar(expr: &FilterExpression) -> Result<&Value, QueryError> {
    match &expr.value {
        FilterValue::Scalar(v) => Ok(v),
        FilterValue::List(_) => Err(QueryError::ExpectedScalar {
            field: expr.column.name.to_string(),
            operator: expr.operator,
        }),
    }
}

fn between_bounds(expr: &FilterExpression) -> Result<(Value, Value), QueryError> {
    let field = expr.column.name;
    let parts: Vec<Value> = match &expr.value {
        FilterValue::Scalar(Value::String(s)) => {
            s.split(',').map(|p| Value::String(p.to_string())).collect()
        }
        FilterValue::Scalar(v) => vec![v.clone()],
        FilterValue::List(items) => items.clone(),
    };

    match <[Value; 2]>::try_from(parts) {
        Ok([low, high]) => Ok((low, high)),
        Err(parts) => Err(QueryError::BetweenArity {
            field: field.to_string(),
            parts: parts.len(),
        }),
    }
}

/// Coerce a filter operand; NULL is never a valid operand
fn bind(column: &Column, raw: &Value) -> Result<SqlValue, QueryError> {
    if raw.is_null() {
        return Err(QueryError::invalid_value(
            column.name,
            "null is not a valid filter value",
        ));
    }
    column.coerce(raw)
}

fn unsupported(column: &Column, operator: Operator) -> QueryError {
    QueryError::UnsupportedOperator {
        field: column.name.to_string(),
        operator,
    }
}
