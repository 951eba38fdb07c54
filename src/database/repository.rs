//! Persistence seams. Every operation takes the caller's [`TenantScope`];
//! rows outside that scope behave exactly like missing rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::filter::{CatalogItemQuery, ResourceQuery};
use crate::models::{CatalogItem, LinkedResource, NewResourceLink, Page, Resource};
use crate::tenancy::TenantScope;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Current versions matching `query`
    async fn list(&self, scope: &TenantScope, query: &CatalogItemQuery) -> Result<Page<CatalogItem>, DatabaseError>;

    /// Any row of any chain, including superseded versions
    async fn get(&self, scope: &TenantScope, id: Uuid) -> Result<Option<CatalogItem>, DatabaseError>;

    /// Head of the chain identified by `original_id`
    async fn get_current(&self, scope: &TenantScope, original_id: Uuid) -> Result<Option<CatalogItem>, DatabaseError>;

    async fn create(&self, scope: &TenantScope, item: &CatalogItem) -> Result<CatalogItem, DatabaseError>;

    /// Atomically supersede `parent_id` with `next` and carry the parent's links over.
    /// Fails with [`crate::versioning::VersionError::Stale`] when the parent is no longer current.
    async fn create_version(
        &self,
        scope: &TenantScope,
        parent_id: Uuid,
        next: &CatalogItem,
    ) -> Result<CatalogItem, DatabaseError>;

    /// Flip the soft-delete flag of one row
    async fn set_active(
        &self,
        scope: &TenantScope,
        id: Uuid,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<CatalogItem, DatabaseError>;

    /// The whole chain containing `id`, oldest first; empty when `id` is unknown
    async fn versions(&self, scope: &TenantScope, id: Uuid) -> Result<Vec<CatalogItem>, DatabaseError>;

    async fn linked_resources(&self, scope: &TenantScope, catalog_item_id: Uuid)
        -> Result<Vec<LinkedResource>, DatabaseError>;

    async fn link_resource(
        &self,
        scope: &TenantScope,
        catalog_item_id: Uuid,
        link: &NewResourceLink,
    ) -> Result<LinkedResource, DatabaseError>;

    /// `false` when no such link existed
    async fn unlink_resource(
        &self,
        scope: &TenantScope,
        catalog_item_id: Uuid,
        resource_id: Uuid,
    ) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn list(&self, scope: &TenantScope, query: &ResourceQuery) -> Result<Page<Resource>, DatabaseError>;

    async fn get(&self, scope: &TenantScope, id: Uuid) -> Result<Option<Resource>, DatabaseError>;

    async fn create(&self, scope: &TenantScope, resource: &Resource) -> Result<Resource, DatabaseError>;

    /// In-place update; resources carry no version history
    async fn update(&self, scope: &TenantScope, resource: &Resource) -> Result<Resource, DatabaseError>;

    async fn set_active(
        &self,
        scope: &TenantScope,
        id: Uuid,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<Resource, DatabaseError>;
}
