//! In-process store selected by `database.backend = memory`.
//!
//! Implements both repository traits over one shared state so that links
//! can resolve resources the same way the SQL joins do.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::repository::{CatalogRepository, ResourceRepository};
use crate::filter::{CatalogItemQuery, ResourceQuery};
use crate::models::{CatalogItem, CatalogItemResource, LinkedResource, NewResourceLink, Page, Resource};
use crate::tenancy::TenantScope;
use crate::versioning::VersionError;

#[derive(Debug, Default)]
struct State {
    items: HashMap<Uuid, CatalogItem>,
    resources: HashMap<Uuid, Resource>,
    links: Vec<CatalogItemResource>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(mut rows: Vec<T>, page: u32, per_page: u32) -> Page<T> {
    let total = rows.len() as i64;
    let offset = ((page.max(1) - 1) as usize).saturating_mul(per_page as usize);
    let items: Vec<T> = if offset >= rows.len() {
        vec![]
    } else {
        rows.drain(offset..).take(per_page as usize).collect()
    };
    Page::new(items, total, page, per_page)
}

impl State {
    fn item(&self, scope: &TenantScope, id: Uuid) -> Option<&CatalogItem> {
        self.items.get(&id).filter(|i| scope.owns(i.tenant_id, i.is_live))
    }

    fn resource(&self, scope: &TenantScope, id: Uuid) -> Option<&Resource> {
        self.resources.get(&id).filter(|r| scope.owns(r.tenant_id, r.is_live))
    }
}

#[async_trait]
impl CatalogRepository for MemoryStore {
    async fn list(&self, scope: &TenantScope, query: &CatalogItemQuery) -> Result<Page<CatalogItem>, DatabaseError> {
        let state = self.state.read().await;
        let mut rows: Vec<CatalogItem> = state
            .items
            .values()
            .filter(|item| query.matches(scope, item))
            .cloned()
            .collect();
        rows.sort_by(|a, b| query.compare(a, b));
        Ok(paginate(rows, query.pagination.page, query.pagination.per_page))
    }

    async fn get(&self, scope: &TenantScope, id: Uuid) -> Result<Option<CatalogItem>, DatabaseError> {
        Ok(self.state.read().await.item(scope, id).cloned())
    }

    async fn get_current(&self, scope: &TenantScope, original_id: Uuid) -> Result<Option<CatalogItem>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .values()
            .find(|i| scope.owns(i.tenant_id, i.is_live) && i.original_id == original_id && i.is_current_version)
            .cloned())
    }

    async fn create(&self, scope: &TenantScope, item: &CatalogItem) -> Result<CatalogItem, DatabaseError> {
        if !scope.owns(item.tenant_id, item.is_live) {
            return Err(DatabaseError::QueryError("catalog item outside caller scope".to_string()));
        }
        let mut state = self.state.write().await;
        if state.items.contains_key(&item.id) {
            return Err(DatabaseError::Conflict("catalog item already exists".to_string()));
        }
        state.items.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn create_version(
        &self,
        scope: &TenantScope,
        parent_id: Uuid,
        next: &CatalogItem,
    ) -> Result<CatalogItem, DatabaseError> {
        let mut state = self.state.write().await;
        let is_current = state.item(scope, parent_id).is_some_and(|p| p.is_current_version);
        if !is_current {
            return Err(VersionError::Stale { parent_id }.into());
        }
        if let Some(parent) = state.items.get_mut(&parent_id) {
            parent.is_current_version = false;
        }
        state.items.insert(next.id, next.clone());

        let carried: Vec<CatalogItemResource> = state
            .links
            .iter()
            .filter(|l| l.catalog_item_id == parent_id)
            .map(|l| CatalogItemResource { id: Uuid::new_v4(), catalog_item_id: next.id, ..l.clone() })
            .collect();
        state.links.extend(carried);
        Ok(next.clone())
    }

    async fn set_active(
        &self,
        scope: &TenantScope,
        id: Uuid,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<CatalogItem, DatabaseError> {
        let mut state = self.state.write().await;
        let item = state
            .items
            .get_mut(&id)
            .filter(|i| scope.owns(i.tenant_id, i.is_live))
            .ok_or_else(|| DatabaseError::NotFound(format!("catalog item {}", id)))?;
        if !item.is_current_version {
            return Err(VersionError::Stale { parent_id: id }.into());
        }
        item.is_active = active;
        item.deleted_at = if active { None } else { Some(now) };
        item.updated_at = now;
        Ok(item.clone())
    }

    async fn versions(&self, scope: &TenantScope, id: Uuid) -> Result<Vec<CatalogItem>, DatabaseError> {
        let state = self.state.read().await;
        let Some(original_id) = state.item(scope, id).map(|i| i.original_id) else {
            return Ok(vec![]);
        };
        let mut chain: Vec<CatalogItem> = state
            .items
            .values()
            .filter(|i| scope.owns(i.tenant_id, i.is_live) && i.original_id == original_id)
            .cloned()
            .collect();
        chain.sort_by_key(|i| i.version_number);
        Ok(chain)
    }

    async fn linked_resources(
        &self,
        scope: &TenantScope,
        catalog_item_id: Uuid,
    ) -> Result<Vec<LinkedResource>, DatabaseError> {
        let state = self.state.read().await;
        let mut links: Vec<&CatalogItemResource> = state
            .links
            .iter()
            .filter(|l| l.catalog_item_id == catalog_item_id && scope.owns(l.tenant_id, l.is_live))
            .collect();
        links.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(links
            .into_iter()
            .filter_map(|link| {
                let resource = state.resource(scope, link.resource_id)?.clone();
                Some(LinkedResource { link: link.clone(), resource })
            })
            .collect())
    }

    async fn link_resource(
        &self,
        scope: &TenantScope,
        catalog_item_id: Uuid,
        link: &NewResourceLink,
    ) -> Result<LinkedResource, DatabaseError> {
        let mut state = self.state.write().await;
        let resource = state
            .resource(scope, link.resource_id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", link.resource_id)))?;
        if !resource.is_active {
            return Err(DatabaseError::Conflict(format!("resource {} is deleted", resource.id)));
        }
        if state
            .links
            .iter()
            .any(|l| l.catalog_item_id == catalog_item_id && l.resource_id == link.resource_id)
        {
            return Err(DatabaseError::Conflict(
                "resource is already linked to this catalog item".to_string(),
            ));
        }

        let created = CatalogItemResource {
            id: Uuid::new_v4(),
            tenant_id: scope.tenant_id,
            is_live: scope.is_live,
            catalog_item_id,
            resource_id: link.resource_id,
            quantity: link.quantity,
            is_required: link.is_required,
            created_at: Utc::now(),
        };
        state.links.push(created.clone());
        Ok(LinkedResource { link: created, resource })
    }

    async fn unlink_resource(
        &self,
        scope: &TenantScope,
        catalog_item_id: Uuid,
        resource_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let mut state = self.state.write().await;
        let before = state.links.len();
        state.links.retain(|l| {
            !(l.catalog_item_id == catalog_item_id
                && l.resource_id == resource_id
                && scope.owns(l.tenant_id, l.is_live))
        });
        Ok(state.links.len() < before)
    }
}

#[async_trait]
impl ResourceRepository for MemoryStore {
    async fn list(&self, scope: &TenantScope, query: &ResourceQuery) -> Result<Page<Resource>, DatabaseError> {
        let state = self.state.read().await;
        let mut rows: Vec<Resource> = state
            .resources
            .values()
            .filter(|r| query.matches(scope, r))
            .cloned()
            .collect();
        rows.sort_by(|a, b| query.compare(a, b));
        Ok(paginate(rows, query.pagination.page, query.pagination.per_page))
    }

    async fn get(&self, scope: &TenantScope, id: Uuid) -> Result<Option<Resource>, DatabaseError> {
        Ok(self.state.read().await.resource(scope, id).cloned())
    }

    async fn create(&self, scope: &TenantScope, resource: &Resource) -> Result<Resource, DatabaseError> {
        if !scope.owns(resource.tenant_id, resource.is_live) {
            return Err(DatabaseError::QueryError("resource outside caller scope".to_string()));
        }
        let mut state = self.state.write().await;
        if state.resources.contains_key(&resource.id) {
            return Err(DatabaseError::Conflict("resource already exists".to_string()));
        }
        state.resources.insert(resource.id, resource.clone());
        Ok(resource.clone())
    }

    async fn update(&self, scope: &TenantScope, resource: &Resource) -> Result<Resource, DatabaseError> {
        let mut state = self.state.write().await;
        let stored = state
            .resources
            .get_mut(&resource.id)
            .filter(|r| scope.owns(r.tenant_id, r.is_live))
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", resource.id)))?;
        // Lifecycle fields only change through set_active
        *stored = Resource {
            is_active: stored.is_active,
            deleted_at: stored.deleted_at,
            created_at: stored.created_at,
            ..resource.clone()
        };
        Ok(stored.clone())
    }

    async fn set_active(
        &self,
        scope: &TenantScope,
        id: Uuid,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<Resource, DatabaseError> {
        let mut state = self.state.write().await;
        let resource = state
            .resources
            .get_mut(&id)
            .filter(|r| scope.owns(r.tenant_id, r.is_live))
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", id)))?;
        resource.is_active = active;
        resource.deleted_at = if active { None } else { Some(now) };
        resource.updated_at = now;
        Ok(resource.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::Pagination;
    use crate::models::catalog_item::fixtures::item;
    use crate::models::resource::fixtures::resource;
    use crate::models::CatalogItemPatch;
    use crate::versioning::{plan_update, UpdatePlan};
    use rust_decimal::Decimal;

    fn scope() -> TenantScope {
        TenantScope { tenant_id: Uuid::new_v4(), is_live: true }
    }

    async fn next_version(store: &MemoryStore, scope: &TenantScope, current: &CatalogItem, price: i64) -> CatalogItem {
        let patch = CatalogItemPatch { unit_price: Some(Decimal::from(price)), ..Default::default() };
        let UpdatePlan::NewVersion { parent_id, next } =
            plan_update(current, current.id, &patch, None, Utc::now()).unwrap()
        else {
            panic!("expected new version");
        };
        store.create_version(scope, parent_id, &next).await.unwrap()
    }

    #[tokio::test]
    async fn version_chain_keeps_one_head_and_carries_links() {
        let store = MemoryStore::new();
        let scope = scope();
        let v1 = CatalogRepository::create(&store, &scope, &item(scope.tenant_id)).await.unwrap();
        let table = ResourceRepository::create(&store, &scope, &resource(scope.tenant_id)).await.unwrap();
        store
            .link_resource(&scope, v1.id, &NewResourceLink { resource_id: table.id, quantity: 2, is_required: true })
            .await
            .unwrap();

        let v2 = next_version(&store, &scope, &v1, 60).await;
        let chain = store.versions(&scope, v1.id).await.unwrap();
        assert_eq!(chain.iter().map(|i| i.version_number).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(chain.iter().filter(|i| i.is_current_version).count(), 1);
        assert_eq!(store.get_current(&scope, v1.original_id).await.unwrap().unwrap().id, v2.id);

        let carried = store.linked_resources(&scope, v2.id).await.unwrap();
        assert_eq!(carried.len(), 1);
        assert_eq!(carried[0].link.quantity, 2);

        // the stale head can no longer be superseded
        let stale = store.create_version(&scope, v1.id, &v2).await.unwrap_err();
        assert!(matches!(stale, DatabaseError::Version(VersionError::Stale { .. })));
    }

    #[tokio::test]
    async fn soft_delete_only_touches_the_head() {
        let store = MemoryStore::new();
        let scope = scope();
        let v1 = CatalogRepository::create(&store, &scope, &item(scope.tenant_id)).await.unwrap();
        let v2 = next_version(&store, &scope, &v1, 65).await;

        let err = CatalogRepository::set_active(&store, &scope, v1.id, false, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Version(VersionError::Stale { .. })));
        assert!(CatalogRepository::get(&store, &scope, v1.id).await.unwrap().unwrap().is_active);

        let deleted = CatalogRepository::set_active(&store, &scope, v2.id, false, Utc::now()).await.unwrap();
        assert!(!deleted.is_active);

        let missing = CatalogRepository::set_active(&store, &scope, Uuid::new_v4(), true, Utc::now()).await;
        assert!(matches!(missing, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn listing_returns_current_versions_in_scope_only() {
        let store = MemoryStore::new();
        let scope = scope();
        let v1 = CatalogRepository::create(&store, &scope, &item(scope.tenant_id)).await.unwrap();
        next_version(&store, &scope, &v1, 70).await;

        let other = TenantScope { tenant_id: Uuid::new_v4(), is_live: true };
        CatalogRepository::create(&store, &other, &item(other.tenant_id)).await.unwrap();

        let query = CatalogItemQuery { pagination: Pagination { page: 1, per_page: 10 }, ..Default::default() };
        let page = CatalogRepository::list(&store, &scope, &query).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].unit_price, Decimal::from(70));

        let test_env = TenantScope { is_live: false, ..scope };
        assert!(CatalogRepository::get(&store, &test_env, v1.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn links_reject_duplicates_and_deleted_resources() {
        let store = MemoryStore::new();
        let scope = scope();
        let v1 = CatalogRepository::create(&store, &scope, &item(scope.tenant_id)).await.unwrap();
        let r = ResourceRepository::create(&store, &scope, &resource(scope.tenant_id)).await.unwrap();
        let link = NewResourceLink { resource_id: r.id, quantity: 1, is_required: false };

        store.link_resource(&scope, v1.id, &link).await.unwrap();
        assert!(matches!(
            store.link_resource(&scope, v1.id, &link).await,
            Err(DatabaseError::Conflict(_))
        ));
        assert!(store.unlink_resource(&scope, v1.id, r.id).await.unwrap());
        assert!(!store.unlink_resource(&scope, v1.id, r.id).await.unwrap());

        ResourceRepository::set_active(&store, &scope, r.id, false, Utc::now()).await.unwrap();
        assert!(matches!(
            store.link_resource(&scope, v1.id, &link).await,
            Err(DatabaseError::Conflict(_))
        ));
        let missing = NewResourceLink { resource_id: Uuid::new_v4(), ..link };
        assert!(matches!(
            store.link_resource(&scope, v1.id, &missing).await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn paginates_after_sorting() {
        let store = MemoryStore::new();
        let scope = scope();
        for n in 0..5 {
            let mut r = resource(scope.tenant_id);
            r.name = format!("Room {}", n);
            ResourceRepository::create(&store, &scope, &r).await.unwrap();
        }
        let query = ResourceQuery {
            sort: vec![crate::filter::SortSpec::new("name", crate::filter::SortDirection::Asc, ResourceQuery::sortable()).unwrap()],
            pagination: Pagination { page: 2, per_page: 2 },
            ..Default::default()
        };
        let page = ResourceRepository::list(&store, &scope, &query).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(), vec!["Room 2", "Room 3"]);
    }
}
