use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use async_graphql::{InputObject, SimpleObject};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::enums::{ResourceStatus, ResourceType};
use crate::database::manager::DatabaseError;

/// Staffable or allocatable entity. Resources are updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, SimpleObject)]
pub struct Resource {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub is_live: bool,
    pub name: String,
    pub description: Option<String>,
    pub resource_type: ResourceType,
    pub status: ResourceStatus,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    #[schema(value_type = Option<String>, example = "25.00")]
    pub hourly_cost: Option<Decimal>,
    pub capacity: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewResource {
    pub name: String,
    pub description: Option<String>,
    pub resource_type: ResourceType,
    pub status: ResourceStatus,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub hourly_cost: Option<Decimal>,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub resource_type: Option<ResourceType>,
    pub status: Option<ResourceStatus>,
    pub contact_email: Option<Option<String>>,
    pub contact_phone: Option<Option<String>>,
    pub hourly_cost: Option<Option<Decimal>>,
    pub capacity: Option<Option<i32>>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, InputObject)]
#[graphql(name = "CreateResourceInput")]
pub struct CreateResourceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub status: Option<ResourceStatus>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    #[schema(value_type = Option<String>)]
    pub hourly_cost: Option<Decimal>,
    pub capacity: Option<i32>,
}

/// An empty string clears an optional text field
#[derive(Debug, Clone, Default, Deserialize, ToSchema, InputObject)]
#[graphql(name = "UpdateResourceInput")]
pub struct UpdateResourceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub status: Option<ResourceStatus>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    #[schema(value_type = Option<String>)]
    pub hourly_cost: Option<Decimal>,
    pub capacity: Option<i32>,
}

impl ResourcePatch {
    pub fn is_empty(&self) -> bool {
        *self == ResourcePatch::default()
    }

    pub fn apply_to(&self, resource: &mut Resource) {
        if let Some(v) = &self.name {
            resource.name = v.clone();
        }
        if let Some(v) = &self.description {
            resource.description = v.clone();
        }
        if let Some(v) = self.resource_type {
            resource.resource_type = v;
        }
        if let Some(v) = self.status {
            resource.status = v;
        }
        if let Some(v) = &self.contact_email {
            resource.contact_email = v.clone();
        }
        if let Some(v) = &self.contact_phone {
            resource.contact_phone = v.clone();
        }
        if let Some(v) = self.hourly_cost {
            resource.hourly_cost = v;
        }
        if let Some(v) = self.capacity {
            resource.capacity = v;
        }
    }
}

/// Association of a resource with one catalog item version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromRow, SimpleObject)]
pub struct CatalogItemResource {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub is_live: bool,
    pub catalog_item_id: Uuid,
    pub resource_id: Uuid,
    pub quantity: i32,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
}

/// Link plus the resource it points at, as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema, SimpleObject)]
pub struct LinkedResource {
    pub link: CatalogItemResource,
    pub resource: Resource,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, InputObject)]
#[graphql(name = "LinkResourceInput")]
pub struct LinkResourceRequest {
    pub resource_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub is_required: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewResourceLink {
    pub resource_id: Uuid,
    pub quantity: i32,
    pub is_required: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub is_live: bool,
    pub name: String,
    pub description: Option<String>,
    pub resource_type: String,
    pub status: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub hourly_cost: Option<Decimal>,
    pub capacity: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = DatabaseError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |field: &str, e: String| {
            DatabaseError::CorruptRow(format!("resources.{} for {}: {}", field, id, e))
        };
        Ok(Self {
            resource_type: row.resource_type.parse().map_err(|e| corrupt("resource_type", e))?,
            status: row.status.parse().map_err(|e| corrupt("status", e))?,
            id: row.id,
            tenant_id: row.tenant_id,
            is_live: row.is_live,
            name: row.name,
            description: row.description,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            hourly_cost: row.hourly_cost,
            capacity: row.capacity,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn resource(tenant_id: Uuid) -> Resource {
        let now = Utc::now();
        Resource {
            id: Uuid::new_v4(),
            tenant_id,
            is_live: true,
            name: "Massage table".to_string(),
            description: None,
            resource_type: ResourceType::Equipment,
            status: ResourceStatus::Available,
            contact_email: None,
            contact_phone: None,
            hourly_cost: Some(Decimal::new(500, 2)),
            capacity: Some(1),
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
