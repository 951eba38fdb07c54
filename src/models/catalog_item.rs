use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use async_graphql::{InputObject, SimpleObject};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::{ItemStatus, ItemType, PricingType};
use crate::database::manager::DatabaseError;

/// One row of a catalog item's version chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, SimpleObject)]
#[graphql(complex)]
pub struct CatalogItem {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub is_live: bool,
    /// Id of version 1; shared by every row of the chain
    pub original_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub version_number: i32,
    pub is_current_version: bool,
    pub name: String,
    pub description: Option<String>,
    pub item_type: ItemType,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub pricing_type: PricingType,
    #[schema(value_type = String, example = "49.99")]
    pub unit_price: Decimal,
    pub currency: String,
    #[schema(value_type = Option<String>, example = "18.00")]
    pub tax_rate: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub image_url: Option<String>,
    pub status: ItemStatus,
    /// Soft-delete flag
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Validated content of a new catalog item
#[derive(Debug, Clone, PartialEq)]
pub struct NewCatalogItem {
    pub name: String,
    pub description: Option<String>,
    pub item_type: ItemType,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub pricing_type: PricingType,
    pub unit_price: Decimal,
    pub currency: String,
    pub tax_rate: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub image_url: Option<String>,
    pub status: ItemStatus,
}

/// Validated partial update. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogItemPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub item_type: Option<ItemType>,
    pub category: Option<Option<String>>,
    pub sku: Option<Option<String>>,
    pub pricing_type: Option<PricingType>,
    pub unit_price: Option<Decimal>,
    pub currency: Option<String>,
    pub tax_rate: Option<Option<Decimal>>,
    pub duration_minutes: Option<Option<i32>>,
    pub image_url: Option<Option<String>>,
    pub status: Option<ItemStatus>,
}

/// REST/GraphQL create payload before validation
#[derive(Debug, Clone, Default, Deserialize, ToSchema, InputObject)]
#[graphql(name = "CreateCatalogItemInput")]
pub struct CreateCatalogItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub item_type: Option<ItemType>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub pricing_type: Option<PricingType>,
    #[schema(value_type = Option<String>, example = "49.99")]
    pub unit_price: Option<Decimal>,
    pub currency: Option<String>,
    #[schema(value_type = Option<String>)]
    pub tax_rate: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub status: Option<ItemStatus>,
}

/// REST/GraphQL update payload before validation.
///
/// An empty string clears an optional text field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, InputObject)]
#[graphql(name = "UpdateCatalogItemInput")]
pub struct UpdateCatalogItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub item_type: Option<ItemType>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub pricing_type: Option<PricingType>,
    #[schema(value_type = Option<String>)]
    pub unit_price: Option<Decimal>,
    pub currency: Option<String>,
    #[schema(value_type = Option<String>)]
    pub tax_rate: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub status: Option<ItemStatus>,
}

impl CatalogItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == CatalogItemPatch::default()
    }

    /// Apply onto a copy of `item`'s content fields. Chain and lifecycle fields are untouched.
    pub fn apply_to(&self, item: &mut CatalogItem) {
        if let Some(v) = &self.name {
            item.name = v.clone();
        }
        if let Some(v) = &self.description {
            item.description = v.clone();
        }
        if let Some(v) = self.item_type {
            item.item_type = v;
        }
        if let Some(v) = &self.category {
            item.category = v.clone();
        }
        if let Some(v) = &self.sku {
            item.sku = v.clone();
        }
        if let Some(v) = self.pricing_type {
            item.pricing_type = v;
        }
        if let Some(v) = self.unit_price {
            item.unit_price = v;
        }
        if let Some(v) = &self.currency {
            item.currency = v.clone();
        }
        if let Some(v) = self.tax_rate {
            item.tax_rate = v;
        }
        if let Some(v) = self.duration_minutes {
            item.duration_minutes = v;
        }
        if let Some(v) = &self.image_url {
            item.image_url = v.clone();
        }
        if let Some(v) = self.status {
            item.status = v;
        }
    }
}

impl CatalogItem {
    /// True when the sellable content of two rows is identical
    pub fn same_content(&self, other: &CatalogItem) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.item_type == other.item_type
            && self.category == other.category
            && self.sku == other.sku
            && self.pricing_type == other.pricing_type
            && self.unit_price == other.unit_price
            && self.currency == other.currency
            && self.tax_rate == other.tax_rate
            && self.duration_minutes == other.duration_minutes
            && self.image_url == other.image_url
            && self.status == other.status
    }
}

/// Raw `catalog_items` row; enums are stored as snake_case text
#[derive(Debug, Clone, FromRow)]
pub struct CatalogItemRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub is_live: bool,
    pub original_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub version_number: i32,
    pub is_current_version: bool,
    pub name: String,
    pub description: Option<String>,
    pub item_type: String,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub pricing_type: String,
    pub unit_price: Decimal,
    pub currency: String,
    pub tax_rate: Option<Decimal>,
    pub duration_minutes: Option<i32>,
    pub image_url: Option<String>,
    pub status: String,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<CatalogItemRow> for CatalogItem {
    type Error = DatabaseError;

    fn try_from(row: CatalogItemRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |field: &str, e: String| {
            DatabaseError::CorruptRow(format!("catalog_items.{} for {}: {}", field, id, e))
        };
        Ok(Self {
            item_type: row.item_type.parse().map_err(|e| corrupt("item_type", e))?,
            pricing_type: row.pricing_type.parse().map_err(|e| corrupt("pricing_type", e))?,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            id: row.id,
            tenant_id: row.tenant_id,
            is_live: row.is_live,
            original_id: row.original_id,
            parent_id: row.parent_id,
            version_number: row.version_number,
            is_current_version: row.is_current_version,
            name: row.name,
            description: row.description,
            category: row.category,
            sku: row.sku,
            unit_price: row.unit_price,
            currency: row.currency,
            tax_rate: row.tax_rate,
            duration_minutes: row.duration_minutes,
            image_url: row.image_url,
            is_active: row.is_active,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn item(tenant_id: Uuid) -> CatalogItem {
        let id = Uuid::new_v4();
        let now = Utc::now();
        CatalogItem {
            id,
            tenant_id,
            is_live: true,
            original_id: id,
            parent_id: None,
            version_number: 1,
            is_current_version: true,
            name: "Deep tissue massage".to_string(),
            description: Some("60 minute session".to_string()),
            item_type: ItemType::Service,
            category: Some("wellness".to_string()),
            sku: Some("MSG-60".to_string()),
            pricing_type: PricingType::PerSession,
            unit_price: Decimal::new(4999, 2),
            currency: "USD".to_string(),
            tax_rate: None,
            duration_minutes: Some(60),
            image_url: None,
            status: ItemStatus::Active,
            is_active: true,
            created_by: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
