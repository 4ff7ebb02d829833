//! Partial update compilation

use serde_json::{Map, Value};

use super::columns::{Column, Table};
use super::error::QueryError;
use crate::data::statement::{SqlValue, Statement};
use crate::utils::sql::quote_ident;

/// Validated partial update of one row
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSpec {
    pub id: i64,
    pub fields: Vec<(&'static Column, SqlValue)>,
}

impl UpdateSpec {
    /// Validate a client field map against the table's updatable columns.
    /// An empty map is rejected before any SQL exists.
    pub fn from_map(
        id: i64,
        map: &Map<String, Value>,
        table: &'static Table,
    ) -> Result<Self, QueryError> {
        if map.is_empty() {
            return Err(QueryError::EmptyUpdate);
        }

        let fields = map
            .iter()
            .map(|(name, raw)| {
                let column = table.updatable(name)?;
                Ok((column, column.coerce(raw)?))
            })
            .collect::<Result<Vec<_>, QueryError>>()?;

        Ok(Self { id, fields })
    }
}

/// `UPDATE <table> SET ... WHERE <pk> = $k RETURNING *`
pub fn build_update(table: &Table, spec: &UpdateSpec) -> Result<Statement, QueryError> {
    if spec.fields.is_empty() {
        return Err(QueryError::EmptyUpdate);
    }

    let mut assignments: Vec<String> = spec
        .fields
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ${}", column.quoted(), i + 1))
        .collect();
    if let Some(stamp) = table.updated_at {
        assignments.push(format!("{} = NOW()", quote_ident(stamp)));
    }

    let mut params: Vec<SqlValue> = spec.fields.iter().map(|(_, v)| v.clone()).collect();
    params.push(SqlValue::Integer(spec.id));

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING *",
        table.name,
        assignments.join(", "),
        quote_ident(table.primary_key),
        params.len()
    );

    Ok(Statement::new(sql, params))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::columns::LEADS;
    use super::*;
    use crate::data::statement::{ColumnType, count_placeholders};

    fn map(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_map_rejected() {
        assert_eq!(
            UpdateSpec::from_map(1, &Map::new(), &LEADS),
            Err(QueryError::EmptyUpdate)
        );
    }

    #[test]
    fn build_single_field() {
        let spec = UpdateSpec::from_map(7, &map(json!({"status": "won"})), &LEADS).unwrap();
        let stmt = build_update(&LEADS, &spec).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE leads SET \"status\" = $1, \"updated_at\" = NOW() WHERE \"id\" = $2 RETURNING *"
        );
        assert_eq!(
            stmt.params,
            vec![SqlValue::Text("won".to_string()), SqlValue::Integer(7)]
        );
    }

    #[test]
    fn build_keeps_field_order_and_coerces() {
        let spec = UpdateSpec::from_map(
            3,
            &map(json!({"score": "80", "company": null, "lead_value": 12.5})),
            &LEADS,
        )
        .unwrap();
        let stmt = build_update(&LEADS, &spec).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE leads SET \"score\" = $1, \"company\" = $2, \"lead_value\" = $3, \"updated_at\" = NOW() WHERE \"id\" = $4 RETURNING *"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlValue::Integer(80),
                SqlValue::Null(ColumnType::Text),
                SqlValue::Float(12.5),
                SqlValue::Integer(3)
            ]
        );
        assert_eq!(count_placeholders(&stmt.sql), stmt.params.len());
    }

    #[test]
    fn unknown_and_read_only_fields_rejected() {
        assert_eq!(
            UpdateSpec::from_map(1, &map(json!({"is_admin": true})), &LEADS),
            Err(QueryError::UnknownField("is_admin".to_string()))
        );
        assert_eq!(
            UpdateSpec::from_map(1, &map(json!({"id": 5})), &LEADS),
            Err(QueryError::ReadOnlyField("id".to_string()))
        );
    }

    #[test]
    fn null_on_required_column_rejected() {
        let err = UpdateSpec::from_map(1, &map(json!({"email": null})), &LEADS).unwrap_err();
        assert!(matches!(err, QueryError::InvalidValue { .. }));
    }

    #[test]
    fn build_rejects_empty_spec() {
        let spec = UpdateSpec { id: 1, fields: vec![] };
        assert_eq!(build_update(&LEADS, &spec), Err(QueryError::EmptyUpdate));
    }
}
