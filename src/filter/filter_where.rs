use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use uuid::Uuid;

use super::error::FilterError;
use super::types::{ColumnType, FilterOp, SqlParam, TableSpec};

/// Compiles a `where` object into a parameterized SQL predicate.
///
/// Placeholders are numbered from `$1` in the order parameters are pushed,
/// including those inside nested `$and` / `$or` / `$not` groups.
pub struct FilterWhere<'t> {
    table: &'t TableSpec,
    params: Vec<SqlParam>,
}

impl<'t> FilterWhere<'t> {
    pub fn new(table: &'t TableSpec) -> Self {
        Self { table, params: vec![] }
    }

    pub fn generate(table: &'t TableSpec, where_data: &Value) -> Result<(String, Vec<SqlParam>), FilterError> {
        let mut filter_where = Self::new(table);
        let sql = filter_where.compile(where_data)?.unwrap_or_else(|| "1=1".to_string());
        Ok((sql, filter_where.params))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn compile(&mut self, where_data: &Value) -> Result<Option<String>, FilterError> {
        match where_data {
            Value::Null => Ok(None),
            Value::Object(obj) => self.compile_object(obj),
            _ => Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        }
    }

    fn compile_object(&mut self, obj: &Map<String, Value>) -> Result<Option<String>, FilterError> {
        let mut parts = vec![];
        for (key, value) in obj {
            let part = if key.starts_with('$') {
                self.logical_operator(key, value)?
            } else {
                self.field_condition(key, value)?
            };
            if let Some(sql) = part {
                parts.push(sql);
            }
        }
        Ok(match parts.len() {
            0 => None,
            _ => Some(parts.join(" AND ")),
        })
    }

    fn logical_operator(&mut self, op: &str, value: &Value) -> Result<Option<String>, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let mut sql_parts = Vec::new();
                for v in arr {
                    if let Some(sql) = self.compile(v)? {
                        sql_parts.push(format!("({})", sql));
                    }
                }
                if sql_parts.is_empty() {
                    // Empty $or matches nothing, empty $and matches everything
                    return Ok(if op == "$or" { Some("1=0".to_string()) } else { None });
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(Some(format!("({})", sql_parts.join(joiner))))
            }
            "$not" => Ok(self.compile(value)?.map(|sql| format!("NOT ({})", sql))),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn field_condition(&mut self, field: &str, value: &Value) -> Result<Option<String>, FilterError> {
        let column_type = self
            .table
            .column_type(field)
            .ok_or_else(|| FilterError::InvalidColumn(format!("{}.{}", self.table.name, field)))?;

        if let Value::Object(obj) = value {
            let mut parts = vec![];
            for (op_key, op_val) in obj {
                let operator = FilterOp::parse(op_key)
                    .ok_or_else(|| FilterError::UnsupportedOperator(op_key.clone()))?;
                parts.push(self.build_condition(field, column_type, operator, op_val)?);
            }
            Ok(if parts.is_empty() { None } else { Some(parts.join(" AND ")) })
        } else {
            // Implicit equality: { field: value }
            Ok(Some(self.build_condition(field, column_type, FilterOp::Eq, value)?))
        }
    }

    fn build_condition(
        &mut self,
        field: &str,
        column_type: ColumnType,
        operator: FilterOp,
        data: &Value,
    ) -> Result<String, FilterError> {
        let quoted_column = format!("\"{}\"", field);
        match operator {
            FilterOp::Eq if data.is_null() => Ok(format!("{} IS NULL", quoted_column)),
            FilterOp::Ne if data.is_null() => Ok(format!("{} IS NOT NULL", quoted_column)),
            FilterOp::Eq => self.binary(&quoted_column, "=", field, column_type, data),
            FilterOp::Ne => self.binary(&quoted_column, "<>", field, column_type, data),
            FilterOp::Gt => self.binary(&quoted_column, ">", field, column_type, data),
            FilterOp::Gte => self.binary(&quoted_column, ">=", field, column_type, data),
            FilterOp::Lt => self.binary(&quoted_column, "<", field, column_type, data),
            FilterOp::Lte => self.binary(&quoted_column, "<=", field, column_type, data),
            FilterOp::ILike => {
                if column_type != ColumnType::Text {
                    return Err(FilterError::InvalidOperatorData(format!("$ilike requires a text column, got {}", field)));
                }
                self.binary(&quoted_column, "ILIKE", field, column_type, data)
            }
            FilterOp::In => {
                let values = data
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$in requires array".to_string()))?;
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let mut placeholders = Vec::with_capacity(values.len());
                for v in values {
                    let param = coerce(field, column_type, v)?;
                    placeholders.push(self.param(param));
                }
                Ok(format!("{} IN ({})", quoted_column, placeholders.join(", ")))
            }
            FilterOp::Between => match data.as_array() {
                Some(values) if values.len() == 2 => {
                    let low = coerce(field, column_type, &values[0])?;
                    let high = coerce(field, column_type, &values[1])?;
                    let low = self.param(low);
                    let high = self.param(high);
                    Ok(format!("{} BETWEEN {} AND {}", quoted_column, low, high))
                }
                _ => Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string())),
            },
        }
    }

    fn binary(
        &mut self,
        quoted_column: &str,
        sql_op: &str,
        field: &str,
        column_type: ColumnType,
        data: &Value,
    ) -> Result<String, FilterError> {
        let param = coerce(field, column_type, data)?;
        Ok(format!("{} {} {}", quoted_column, sql_op, self.param(param)))
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}

/// Convert a JSON literal into the bind type of `column_type`
pub fn coerce(field: &str, column_type: ColumnType, value: &Value) -> Result<SqlParam, FilterError> {
    let invalid = || {
        FilterError::InvalidOperatorData(format!("value {} is not valid for column {}", value, field))
    };
    match (column_type, value) {
        (ColumnType::Uuid, Value::String(s)) => Uuid::parse_str(s).map(SqlParam::Uuid).map_err(|_| invalid()),
        (ColumnType::Text, Value::String(s)) => Ok(SqlParam::Text(s.clone())),
        (ColumnType::Bool, Value::Bool(b)) => Ok(SqlParam::Bool(*b)),
        (ColumnType::Bool, Value::String(s)) => s.parse::<bool>().map(SqlParam::Bool).map_err(|_| invalid()),
        (ColumnType::Int, Value::Number(n)) => n.as_i64().map(SqlParam::Int).ok_or_else(invalid),
        (ColumnType::Int, Value::String(s)) => s.parse::<i64>().map(SqlParam::Int).map_err(|_| invalid()),
        (ColumnType::Numeric, Value::Number(n)) => {
            Decimal::from_str(&n.to_string()).map(SqlParam::Numeric).map_err(|_| invalid())
        }
        (ColumnType::Numeric, Value::String(s)) => Decimal::from_str(s).map(SqlParam::Numeric).map_err(|_| invalid()),
        (ColumnType::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s)
            .map(|dt| SqlParam::Timestamp(dt.with_timezone(&Utc)))
            .map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tables::CATALOG_ITEMS;
    use serde_json::json;

    #[test]
    fn implicit_equality_and_typed_params() {
        let tenant = Uuid::new_v4();
        let (sql, params) =
            FilterWhere::generate(&CATALOG_ITEMS, &json!({ "tenant_id": tenant.to_string() })).unwrap();
        assert_eq!(sql, "\"tenant_id\" = $1");
        assert_eq!(params, vec![SqlParam::Uuid(tenant)]);
    }

    #[test]
    fn null_equality_is_is_null() {
        let (sql, params) = FilterWhere::generate(&CATALOG_ITEMS, &json!({ "parent_id": null })).unwrap();
        assert_eq!(sql, "\"parent_id\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn nested_or_continues_numbering() {
        let (sql, params) = FilterWhere::generate(
            &CATALOG_ITEMS,
            &json!({
                "$or": [
                    { "name": { "$ilike": "%spa%" } },
                    { "sku": { "$ilike": "%spa%" } }
                ],
                "status": "active"
            }),
        )
        .unwrap();
        assert_eq!(sql, "((\"name\" ILIKE $1) OR (\"sku\" ILIKE $2)) AND \"status\" = $3");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn between_binds_numeric() {
        let (sql, params) = FilterWhere::generate(
            &CATALOG_ITEMS,
            &json!({ "unit_price": { "$between": ["10.00", 25] } }),
        )
        .unwrap();
        assert_eq!(sql, "\"unit_price\" BETWEEN $1 AND $2");
        assert_eq!(
            params,
            vec![SqlParam::Numeric(Decimal::new(1000, 2)), SqlParam::Numeric(Decimal::from(25))]
        );
    }

    #[test]
    fn in_with_empty_list_matches_nothing() {
        let (sql, _) = FilterWhere::generate(&CATALOG_ITEMS, &json!({ "id": { "$in": [] } })).unwrap();
        assert_eq!(sql, "1=0");
    }

    #[test]
    fn not_wraps_group() {
        let (sql, params) =
            FilterWhere::generate(&CATALOG_ITEMS, &json!({ "$not": { "is_active": true } })).unwrap();
        assert_eq!(sql, "NOT (\"is_active\" = $1)");
        assert_eq!(params, vec![SqlParam::Bool(true)]);
    }

    #[test]
    fn rejects_unknown_column() {
        let err = FilterWhere::generate(&CATALOG_ITEMS, &json!({ "password": "x" })).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn rejects_injection_through_column_name() {
        let err = FilterWhere::generate(&CATALOG_ITEMS, &json!({ "name\" OR 1=1 --": "x" })).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn rejects_uncoercible_values() {
        let err = FilterWhere::generate(&CATALOG_ITEMS, &json!({ "tenant_id": "not-a-uuid" })).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));
        let err = FilterWhere::generate(&CATALOG_ITEMS, &json!({ "unit_price": { "$ilike": "1%" } })).unwrap_err();
        assert!(matches!(err, FilterError::InvalidOperatorData(_)));
    }

    #[test]
    fn rejects_unknown_operator() {
        let err = FilterWhere::generate(&CATALOG_ITEMS, &json!({ "name": { "$regex": ".*" } })).unwrap_err();
        assert_eq!(err, FilterError::UnsupportedOperator("$regex".to_string()));
    }

    #[test]
    fn empty_where_is_tautology() {
        let (sql, params) = FilterWhere::generate(&CATALOG_ITEMS, &json!({})).unwrap();
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }
}
