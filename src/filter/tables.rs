use super::types::{ColumnType, TableSpec};

pub static CATALOG_ITEMS: TableSpec = TableSpec {
    name: "catalog_items",
    columns: &[
        ("id", ColumnType::Uuid),
        ("tenant_id", ColumnType::Uuid),
        ("is_live", ColumnType::Bool),
        ("original_id", ColumnType::Uuid),
        ("parent_id", ColumnType::Uuid),
        ("version_number", ColumnType::Int),
        ("is_current_version", ColumnType::Bool),
        ("name", ColumnType::Text),
        ("description", ColumnType::Text),
        ("item_type", ColumnType::Text),
        ("category", ColumnType::Text),
        ("sku", ColumnType::Text),
        ("pricing_type", ColumnType::Text),
        ("unit_price", ColumnType::Numeric),
        ("currency", ColumnType::Text),
        ("tax_rate", ColumnType::Numeric),
        ("duration_minutes", ColumnType::Int),
        ("image_url", ColumnType::Text),
        ("status", ColumnType::Text),
        ("is_active", ColumnType::Bool),
        ("created_by", ColumnType::Uuid),
        ("created_at", ColumnType::Timestamp),
        ("updated_at", ColumnType::Timestamp),
        ("deleted_at", ColumnType::Timestamp),
    ],
};

pub static RESOURCES: TableSpec = TableSpec {
    name: "resources",
    columns: &[
        ("id", ColumnType::Uuid),
        ("tenant_id", ColumnType::Uuid),
        ("is_live", ColumnType::Bool),
        ("name", ColumnType::Text),
        ("description", ColumnType::Text),
        ("resource_type", ColumnType::Text),
        ("status", ColumnType::Text),
        ("contact_email", ColumnType::Text),
        ("contact_phone", ColumnType::Text),
        ("hourly_cost", ColumnType::Numeric),
        ("capacity", ColumnType::Int),
        ("is_active", ColumnType::Bool),
        ("created_at", ColumnType::Timestamp),
        ("updated_at", ColumnType::Timestamp),
        ("deleted_at", ColumnType::Timestamp),
    ],
};

/// Columns clients may sort catalog listings by
pub const CATALOG_SORTABLE: &[&str] = &[
    "name",
    "unit_price",
    "created_at",
    "updated_at",
    "version_number",
    "status",
    "item_type",
    "category",
    "sku",
];

pub const RESOURCE_SORTABLE: &[&str] = &[
    "name",
    "resource_type",
    "status",
    "hourly_cost",
    "capacity",
    "created_at",
    "updated_at",
];
