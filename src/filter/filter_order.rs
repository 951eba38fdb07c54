use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection, TableSpec};

pub struct FilterOrder;

impl FilterOrder {
    pub fn validate_and_parse(table: &TableSpec, order: &Value) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let infos = match order {
            Value::Null => vec![],
            Value::String(s) => Self::parse_order_string(s)?,
            Value::Array(arr) => {
                // Expect array of strings like ["created_at desc", "name asc"]
                let mut out = Vec::new();
                for v in arr {
                    match v {
                        Value::String(s) => out.extend(Self::parse_order_string(s)?),
                        other => return Err(FilterError::InvalidSort(format!("unsupported order entry: {}", other))),
                    }
                }
                out
            }
            Value::Object(obj) => {
                // { "created_at": "desc", "name": "asc" }
                let mut out = Vec::new();
                for (k, v) in obj {
                    let raw = v.as_str().ok_or_else(|| {
                        FilterError::InvalidSort(format!("direction for {} must be a string, got {}", k, v))
                    })?;
                    let sort = SortDirection::parse(raw)
                        .ok_or_else(|| FilterError::InvalidSort(format!("invalid direction '{}' for {}", raw, k)))?;
                    out.push(FilterOrderInfo { column: k.clone(), sort });
                }
                out
            }
            other => return Err(FilterError::InvalidSort(format!("unsupported order format: {}", other))),
        };

        for info in &infos {
            if table.column_type(&info.column).is_none() {
                return Err(FilterError::InvalidColumn(format!("{}.{}", table.name, info.column)));
            }
        }
        Ok(infos)
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        // split on commas, then each token into column and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let dir = it.next().unwrap_or("asc");
                let sort = SortDirection::parse(dir)
                    .ok_or_else(|| FilterError::InvalidSort(format!("invalid direction '{}' for {}", dir, col)))?;
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        Ok(out)
    }

    /// ORDER BY clause with an `id` tiebreaker so that offset pagination is stable
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        let mut parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        if !infos.iter().any(|i| i.column == "id") {
            parts.push("\"id\" ASC".to_string());
        }
        format!("ORDER BY {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tables::CATALOG_ITEMS;
    use serde_json::json;

    #[test]
    fn parses_string_forms() {
        let infos = FilterOrder::validate_and_parse(&CATALOG_ITEMS, &json!("unit_price desc, name")).unwrap();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].sort, SortDirection::Desc);
        assert_eq!(infos[1].column, "name");
        assert_eq!(infos[1].sort, SortDirection::Asc);
    }

    #[test]
    fn parses_array_and_object_forms() {
        let a = FilterOrder::validate_and_parse(&CATALOG_ITEMS, &json!(["created_at desc"])).unwrap();
        assert_eq!(a[0].column, "created_at");
        let o = FilterOrder::validate_and_parse(&CATALOG_ITEMS, &json!({ "name": "DESC" })).unwrap();
        assert_eq!(o[0].sort, SortDirection::Desc);
    }

    #[test]
    fn rejects_unknown_column_and_direction() {
        assert!(matches!(
            FilterOrder::validate_and_parse(&CATALOG_ITEMS, &json!("secret asc")),
            Err(FilterError::InvalidColumn(_))
        ));
        assert!(matches!(
            FilterOrder::validate_and_parse(&CATALOG_ITEMS, &json!("name sideways")),
            Err(FilterError::InvalidSort(_))
        ));
    }

    #[test]
    fn object_directions_must_be_strings() {
        for direction in [json!(1), json!(null), json!(true), json!({ "dir": "asc" })] {
            assert!(matches!(
                FilterOrder::validate_and_parse(&CATALOG_ITEMS, &json!({ "name": direction })),
                Err(FilterError::InvalidSort(_))
            ));
        }
    }

    #[test]
    fn appends_id_tiebreaker() {
        let infos = vec![FilterOrderInfo { column: "name".into(), sort: SortDirection::Asc }];
        assert_eq!(FilterOrder::generate(&infos), "ORDER BY \"name\" ASC, \"id\" ASC");
        assert_eq!(FilterOrder::generate(&[]), "ORDER BY \"id\" ASC");
    }
}
