//! Typed list queries for catalog items and resources.
//!
//! Both REST query strings and GraphQL arguments are translated into these
//! structs; they compile into [`FilterData`] for the SQL backend and also
//! evaluate directly against records for the in-memory backend.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};

use super::error::FilterError;
use super::tables::{CATALOG_SORTABLE, RESOURCE_SORTABLE};
use super::types::{FilterData, SortDirection};
use crate::config::FilterConfig;
use crate::models::{CatalogItem, ItemStatus, ItemType, Resource, ResourceStatus, ResourceType};
use crate::naming::to_snake_case;
use crate::tenancy::TenantScope;

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    /// snake_case column name, already whitelisted
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Accepts `unit_price`, `unitPrice` or `UNIT_PRICE` for any whitelisted column
    pub fn new(field: &str, direction: SortDirection, sortable: &[&str]) -> Result<Self, FilterError> {
        let column = to_snake_case(field);
        if !sortable.contains(&column.as_str()) {
            return Err(FilterError::InvalidSort(format!(
                "cannot sort by '{}'; sortable fields: {}",
                field,
                sortable.join(", ")
            )));
        }
        Ok(Self { field: column, direction })
    }

    /// REST form: `unit_price:desc,name` (direction defaults to ascending)
    pub fn parse_list(raw: &str, sortable: &[&str]) -> Result<Vec<Self>, FilterError> {
        let mut out = vec![];
        for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, direction) = match part.split_once(':') {
                Some((field, dir)) => {
                    let direction = SortDirection::parse(dir)
                        .ok_or_else(|| FilterError::InvalidSort(format!("invalid direction '{}'", dir)))?;
                    (field, direction)
                }
                None => (part, SortDirection::Asc),
            };
            out.push(Self::new(field, direction, sortable)?);
        }
        Ok(out)
    }

    fn default_order() -> Vec<Self> {
        vec![Self { field: "created_at".to_string(), direction: SortDirection::Desc }]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>, config: &FilterConfig) -> Result<Self, FilterError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(FilterError::InvalidOffset("page must be at least 1".to_string()));
        }
        let per_page = per_page.unwrap_or(config.default_limit as i64);
        if per_page < 1 {
            return Err(FilterError::InvalidLimit("per_page must be at least 1".to_string()));
        }
        let max = config.max_limit.max(1) as i64;
        let per_page = if per_page > max {
            if config.debug_logging {
                tracing::debug!("per_page {} exceeds max {}, capping to max", per_page, max);
            }
            max
        } else {
            per_page
        };
        let page = u32::try_from(page)
            .map_err(|_| FilterError::InvalidOffset("page is too large".to_string()))?;
        Ok(Self { page, per_page: per_page as u32 })
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.per_page as i64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, per_page: 25 }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogItemQuery {
    pub search: Option<String>,
    pub item_type: Option<ItemType>,
    pub status: Option<ItemStatus>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub include_inactive: bool,
    pub sort: Vec<SortSpec>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceQuery {
    pub search: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub status: Option<ResourceStatus>,
    pub include_inactive: bool,
    pub sort: Vec<SortSpec>,
    pub pagination: Pagination,
}

impl CatalogItemQuery {
    pub fn sortable() -> &'static [&'static str] {
        CATALOG_SORTABLE
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(FilterError::InvalidOperatorData(
                    "min_price must not be greater than max_price".to_string(),
                ));
            }
        }
        for bound in [self.min_price, self.max_price].into_iter().flatten() {
            if bound.is_sign_negative() {
                return Err(FilterError::InvalidOperatorData("price bounds must be non-negative".to_string()));
            }
        }
        Ok(())
    }

    /// Listings only ever see current versions within the caller's scope
    pub fn to_filter_data(&self, scope: &TenantScope) -> FilterData {
        let mut conditions = scope_conditions(scope, self.include_inactive);
        conditions.insert("is_current_version".into(), json!(true));

        if let Some(item_type) = self.item_type {
            conditions.insert("item_type".into(), json!(item_type.as_str()));
        }
        if let Some(status) = self.status {
            conditions.insert("status".into(), json!(status.as_str()));
        }
        if let Some(category) = &self.category {
            conditions.insert("category".into(), json!(category));
        }
        match (self.min_price, self.max_price) {
            (Some(min), Some(max)) => {
                conditions.insert("unit_price".into(), json!({ "$between": [min.to_string(), max.to_string()] }));
            }
            (Some(min), None) => {
                conditions.insert("unit_price".into(), json!({ "$gte": min.to_string() }));
            }
            (None, Some(max)) => {
                conditions.insert("unit_price".into(), json!({ "$lte": max.to_string() }));
            }
            (None, None) => {}
        }
        if let Some(pattern) = search_pattern(self.search.as_deref()) {
            conditions.insert(
                "$or".into(),
                json!([
                    { "name": { "$ilike": pattern } },
                    { "description": { "$ilike": pattern } },
                    { "sku": { "$ilike": pattern } }
                ]),
            );
        }

        filter_data(conditions, &self.sort, &self.pagination)
    }

    pub fn matches(&self, scope: &TenantScope, item: &CatalogItem) -> bool {
        if !scope.owns(item.tenant_id, item.is_live) || !item.is_current_version {
            return false;
        }
        if !self.include_inactive && !item.is_active {
            return false;
        }
        if self.item_type.is_some_and(|t| t != item.item_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != item.status) {
            return false;
        }
        if let Some(category) = &self.category {
            if item.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| item.unit_price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| item.unit_price > max) {
            return false;
        }
        match normalized_search(self.search.as_deref()) {
            Some(needle) => [Some(item.name.as_str()), item.description.as_deref(), item.sku.as_deref()]
                .into_iter()
                .flatten()
                .any(|haystack| haystack.to_lowercase().contains(&needle)),
            None => true,
        }
    }

    pub fn compare(&self, a: &CatalogItem, b: &CatalogItem) -> Ordering {
        compare_by(&self.sort, |field, item: &CatalogItem| catalog_sort_value(field, item), a, b)
            .then_with(|| a.id.cmp(&b.id))
    }
}

impl ResourceQuery {
    pub fn sortable() -> &'static [&'static str] {
        RESOURCE_SORTABLE
    }

    pub fn to_filter_data(&self, scope: &TenantScope) -> FilterData {
        let mut conditions = scope_conditions(scope, self.include_inactive);
        if let Some(resource_type) = self.resource_type {
            conditions.insert("resource_type".into(), json!(resource_type.as_str()));
        }
        if let Some(status) = self.status {
            conditions.insert("status".into(), json!(status.as_str()));
        }
        if let Some(pattern) = search_pattern(self.search.as_deref()) {
            conditions.insert(
                "$or".into(),
                json!([
                    { "name": { "$ilike": pattern } },
                    { "description": { "$ilike": pattern } }
                ]),
            );
        }
        filter_data(conditions, &self.sort, &self.pagination)
    }

    pub fn matches(&self, scope: &TenantScope, resource: &Resource) -> bool {
        if !scope.owns(resource.tenant_id, resource.is_live) {
            return false;
        }
        if !self.include_inactive && !resource.is_active {
            return false;
        }
        if self.resource_type.is_some_and(|t| t != resource.resource_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != resource.status) {
            return false;
        }
        match normalized_search(self.search.as_deref()) {
            Some(needle) => [Some(resource.name.as_str()), resource.description.as_deref()]
                .into_iter()
                .flatten()
                .any(|haystack| haystack.to_lowercase().contains(&needle)),
            None => true,
        }
    }

    pub fn compare(&self, a: &Resource, b: &Resource) -> Ordering {
        compare_by(&self.sort, |field, r: &Resource| resource_sort_value(field, r), a, b)
            .then_with(|| a.id.cmp(&b.id))
    }
}

fn scope_conditions(scope: &TenantScope, include_inactive: bool) -> Map<String, Value> {
    let mut conditions = Map::new();
    conditions.insert("tenant_id".into(), json!(scope.tenant_id.to_string()));
    conditions.insert("is_live".into(), json!(scope.is_live));
    if !include_inactive {
        conditions.insert("is_active".into(), json!(true));
    }
    conditions
}

fn filter_data(conditions: Map<String, Value>, sort: &[SortSpec], pagination: &Pagination) -> FilterData {
    let sort = if sort.is_empty() { SortSpec::default_order() } else { sort.to_vec() };
    let order = sort
        .iter()
        .map(|s| format!("{} {}", s.field, s.direction.to_sql().to_ascii_lowercase()))
        .collect::<Vec<_>>()
        .join(", ");
    FilterData {
        where_clause: Some(Value::Object(conditions)),
        order: Some(Value::String(order)),
        limit: Some(pagination.per_page as i64),
        offset: Some(pagination.offset()),
    }
}

/// Trimmed free-text filter value; blank means no filter
pub fn text_filter(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn normalized_search(search: Option<&str>) -> Option<String> {
    search.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase)
}

/// `%term%` with LIKE wildcards in the term escaped
fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    Some(escaped)
}

/// Value of a sortable column; `None` sorts last ascending, first descending (Postgres default)
#[derive(Debug, PartialEq, PartialOrd)]
enum SortValue {
    Text(Option<String>),
    Number(Option<Decimal>),
    Time(Option<DateTime<Utc>>),
}

fn catalog_sort_value(field: &str, item: &CatalogItem) -> SortValue {
    match field {
        "name" => SortValue::Text(Some(item.name.clone())),
        "unit_price" => SortValue::Number(Some(item.unit_price)),
        "created_at" => SortValue::Time(Some(item.created_at)),
        "updated_at" => SortValue::Time(Some(item.updated_at)),
        "version_number" => SortValue::Number(Some(Decimal::from(item.version_number))),
        "status" => SortValue::Text(Some(item.status.as_str().to_string())),
        "item_type" => SortValue::Text(Some(item.item_type.as_str().to_string())),
        "category" => SortValue::Text(item.category.clone()),
        "sku" => SortValue::Text(item.sku.clone()),
        _ => SortValue::Text(None),
    }
}

fn resource_sort_value(field: &str, r: &Resource) -> SortValue {
    match field {
        "name" => SortValue::Text(Some(r.name.clone())),
        "resource_type" => SortValue::Text(Some(r.resource_type.as_str().to_string())),
        "status" => SortValue::Text(Some(r.status.as_str().to_string())),
        "hourly_cost" => SortValue::Number(r.hourly_cost),
        "capacity" => SortValue::Number(r.capacity.map(Decimal::from)),
        "created_at" => SortValue::Time(Some(r.created_at)),
        "updated_at" => SortValue::Time(Some(r.updated_at)),
        _ => SortValue::Text(None),
    }
}

fn compare_by<T>(sort: &[SortSpec], value: impl Fn(&str, &T) -> SortValue, a: &T, b: &T) -> Ordering {
    let default_order = SortSpec::default_order();
    let sort = if sort.is_empty() { default_order.as_slice() } else { sort };
    for spec in sort {
        let ordering = nulls_last(&value(&spec.field, a), &value(&spec.field, b));
        let ordering = match spec.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn nulls_last(a: &SortValue, b: &SortValue) -> Ordering {
    fn cmp_opt<T: PartialOrd>(a: &Option<T>, b: &Option<T>) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
    match (a, b) {
        (SortValue::Text(x), SortValue::Text(y)) => cmp_opt(x, y),
        (SortValue::Number(x), SortValue::Number(y)) => cmp_opt(x, y),
        (SortValue::Time(x), SortValue::Time(y)) => cmp_opt(x, y),
        _ => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    }
}
