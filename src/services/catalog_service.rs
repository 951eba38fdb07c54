use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditSink};
use crate::config::StorageConfig;
use crate::database::CatalogRepository;
use crate::error::ApiError;
use crate::filter::CatalogItemQuery;
use crate::models::{
    CatalogItem, CatalogItemPatch, CreateCatalogItemRequest, LinkResourceRequest, LinkedResource, Page,
    UpdateCatalogItemRequest,
};
use crate::storage::{catalog_image_path, BlobStore, StoredObject};
use crate::tenancy::{TenantContext, TenantScope};
use crate::types::{Entity, Operation};
use crate::validation::{
    validate_catalog_item, validate_create_item, validate_link, validate_update_item, validate_upload,
};
use crate::versioning::{plan_create, plan_update, UpdatePlan, VersionError};

/// Result of an image upload: the stored blob and the version that references it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ImageUpload {
    pub item: CatalogItem,
    pub object: StoredObject,
}

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
    blobs: Arc<dyn BlobStore>,
    audit: Arc<dyn AuditSink>,
    storage: StorageConfig,
}

impl CatalogService {
    pub fn new(
        repo: Arc<dyn CatalogRepository>,
        blobs: Arc<dyn BlobStore>,
        audit: Arc<dyn AuditSink>,
        storage: StorageConfig,
    ) -> Self {
        Self { repo, blobs, audit, storage }
    }

    pub async fn list_items(&self, ctx: &TenantContext, query: &CatalogItemQuery) -> Result<Page<CatalogItem>, ApiError> {
        query.validate()?;
        Ok(self.repo.list(&ctx.scope(), query).await?)
    }

    /// Any version, current or superseded
    pub async fn get_item(&self, ctx: &TenantContext, id: Uuid) -> Result<CatalogItem, ApiError> {
        self.repo
            .get(&ctx.scope(), id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create_item(&self, ctx: &TenantContext, req: CreateCatalogItemRequest) -> Result<CatalogItem, ApiError> {
        let new_item = validate_create_item(req)?;
        let scope = ctx.scope();
        let item = plan_create(&scope, new_item, Some(ctx.user_id), Utc::now());
        let created = self.repo.create(&scope, &item).await?;

        tracing::info!(id = %created.id, tenant_id = %ctx.tenant_id, "Created catalog item");
        self.audit.record(
            AuditEvent::new(ctx, Operation::Create, Entity::CatalogItem, Some(created.id))
                .with_detail(json!({ "name": created.name, "version_number": 1 })),
        );
        Ok(created)
    }

    /// Appends a new version; `id` must be the current version of its chain
    pub async fn update_item(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        req: UpdateCatalogItemRequest,
    ) -> Result<CatalogItem, ApiError> {
        let patch = validate_update_item(req)?;
        self.apply_patch(ctx, id, &patch, Operation::Update).await
    }

    pub async fn delete_item(&self, ctx: &TenantContext, id: Uuid) -> Result<CatalogItem, ApiError> {
        self.set_active(ctx, id, false).await
    }

    pub async fn restore_item(&self, ctx: &TenantContext, id: Uuid) -> Result<CatalogItem, ApiError> {
        self.set_active(ctx, id, true).await
    }

    /// Whole chain containing `id`, oldest first
    pub async fn item_versions(&self, ctx: &TenantContext, id: Uuid) -> Result<Vec<CatalogItem>, ApiError> {
        let chain = self.repo.versions(&ctx.scope(), id).await?;
        if chain.is_empty() {
            return Err(not_found(id));
        }
        Ok(chain)
    }

    /// Links of exactly the version `id` names
    pub async fn item_resources(&self, ctx: &TenantContext, id: Uuid) -> Result<Vec<LinkedResource>, ApiError> {
        let item = self.get_item(ctx, id).await?;
        Ok(self.repo.linked_resources(&ctx.scope(), item.id).await?)
    }

    /// Links attach to the chain's current version and are carried onto later versions
    pub async fn link_resource(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        req: LinkResourceRequest,
    ) -> Result<LinkedResource, ApiError> {
        let link = validate_link(req)?;
        let scope = ctx.scope();
        let current = self.writable_head(&scope, id).await?;
        let linked = self.repo.link_resource(&scope, current.id, &link).await?;

        self.audit.record(
            AuditEvent::new(ctx, Operation::Link, Entity::CatalogItemResource, Some(linked.link.id))
                .with_detail(json!({ "catalog_item_id": current.id, "resource_id": link.resource_id })),
        );
        Ok(linked)
    }

    pub async fn unlink_resource(&self, ctx: &TenantContext, id: Uuid, resource_id: Uuid) -> Result<(), ApiError> {
        let scope = ctx.scope();
        let current = self.writable_head(&scope, id).await?;
        if !self.repo.unlink_resource(&scope, current.id, resource_id).await? {
            return Err(ApiError::not_found(format!(
                "resource {} is not linked to catalog item {}",
                resource_id, current.id
            )));
        }

        self.audit.record(
            AuditEvent::new(ctx, Operation::Unlink, Entity::CatalogItemResource, None)
                .with_detail(json!({ "catalog_item_id": current.id, "resource_id": resource_id })),
        );
        Ok(())
    }

    /// Stores the image, then records its URL as a new version of the item
    pub async fn upload_item_image(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<ImageUpload, ApiError> {
        let extension = validate_upload(content_type, bytes.len(), &self.storage)?;
        let scope = ctx.scope();
        let target = self.get_item(ctx, id).await?;
        // Fail before uploading anything the new version could not reference
        let current_id = self.current_id(&scope, &target).await?;
        plan_update(&target, current_id, &CatalogItemPatch::default(), None, Utc::now())?;

        let path = catalog_image_path(&scope, target.original_id, extension);
        let content_type = content_type.unwrap_or_default().trim().to_ascii_lowercase();
        let object = self.blobs.put(&path, &content_type, bytes).await?;

        let patch = CatalogItemPatch { image_url: Some(Some(object.url.clone())), ..Default::default() };
        let item = match self.apply_patch(ctx, id, &patch, Operation::Upload).await {
            Ok(item) => item,
            Err(e) => {
                if let Err(cleanup) = self.blobs.delete(&object.path).await {
                    tracing::warn!(path = %object.path, "Failed to remove orphaned upload: {}", cleanup);
                }
                return Err(e);
            }
        };
        Ok(ImageUpload { item, object })
    }

    async fn apply_patch(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        patch: &CatalogItemPatch,
        action: Operation,
    ) -> Result<CatalogItem, ApiError> {
        let scope = ctx.scope();
        let target = self.get_item(ctx, id).await?;
        let current_id = self.current_id(&scope, &target).await?;

        let (parent_id, next) = match plan_update(&target, current_id, patch, Some(ctx.user_id), Utc::now())? {
            UpdatePlan::Unchanged(item) => {
                tracing::debug!(id = %item.id, "Catalog item update changed nothing");
                return Ok(item);
            }
            UpdatePlan::NewVersion { parent_id, next } => (parent_id, next),
        };
        validate_catalog_item(&next)?;

        let created = self.repo.create_version(&scope, parent_id, &next).await?;
        tracing::info!(
            original_id = %created.original_id,
            version = created.version_number,
            "Created catalog item version"
        );
        self.audit.record(
            AuditEvent::new(ctx, action, Entity::CatalogItem, Some(created.id)).with_detail(json!({
                "parent_id": parent_id,
                "original_id": created.original_id,
                "version_number": created.version_number,
            })),
        );
        Ok(created)
    }

    /// Soft delete and restore act on the chain head, whichever member `id` names
    async fn set_active(&self, ctx: &TenantContext, id: Uuid, active: bool) -> Result<CatalogItem, ApiError> {
        let scope = ctx.scope();
        let target = self.get_item(ctx, id).await?;
        let current = self.head(&scope, &target).await?;
        if current.is_active == active {
            return Ok(current);
        }

        let updated = self.repo.set_active(&scope, current.id, active, Utc::now()).await?;
        let action = if active { Operation::Restore } else { Operation::Delete };
        tracing::info!(id = %updated.id, active, "Changed catalog item lifecycle");
        self.audit.record(AuditEvent::new(ctx, action, Entity::CatalogItem, Some(updated.id)));
        Ok(updated)
    }

    /// Current, non-deleted version of the chain containing `id`
    async fn writable_head(&self, scope: &TenantScope, id: Uuid) -> Result<CatalogItem, ApiError> {
        let target = self.repo.get(scope, id).await?.ok_or_else(|| not_found(id))?;
        let current = self.head(scope, &target).await?;
        if !current.is_active {
            return Err(VersionError::Deleted { id: current.id }.into());
        }
        Ok(current)
    }

    async fn head(&self, scope: &TenantScope, member: &CatalogItem) -> Result<CatalogItem, ApiError> {
        if member.is_current_version {
            return Ok(member.clone());
        }
        self.repo
            .get_current(scope, member.original_id)
            .await?
            .ok_or_else(|| not_found(member.original_id))
    }

    async fn current_id(&self, scope: &TenantScope, member: &CatalogItem) -> Result<Uuid, ApiError> {
        Ok(self.head(scope, member).await?.id)
    }
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::not_found(format!("catalog item {} not found", id))
}
