use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditSink};
use crate::database::ResourceRepository;
use crate::error::ApiError;
use crate::filter::ResourceQuery;
use crate::models::{CreateResourceRequest, Page, Resource, UpdateResourceRequest};
use crate::tenancy::TenantContext;
use crate::types::{Entity, Operation};
use crate::validation::{validate_create_resource, validate_update_resource};

#[derive(Clone)]
pub struct ResourceService {
    repo: Arc<dyn ResourceRepository>,
    audit: Arc<dyn AuditSink>,
}

impl ResourceService {
    pub fn new(repo: Arc<dyn ResourceRepository>, audit: Arc<dyn AuditSink>) -> Self {
        Self { repo, audit }
    }

    pub async fn list(&self, ctx: &TenantContext, query: &ResourceQuery) -> Result<Page<Resource>, ApiError> {
        Ok(self.repo.list(&ctx.scope(), query).await?)
    }

    pub async fn get(&self, ctx: &TenantContext, id: Uuid) -> Result<Resource, ApiError> {
        self.repo
            .get(&ctx.scope(), id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, ctx: &TenantContext, req: CreateResourceRequest) -> Result<Resource, ApiError> {
        let new_resource = validate_create_resource(req)?;
        let scope = ctx.scope();
        let now = Utc::now();
        let resource = Resource {
            id: Uuid::new_v4(),
            tenant_id: scope.tenant_id,
            is_live: scope.is_live,
            name: new_resource.name,
            description: new_resource.description,
            resource_type: new_resource.resource_type,
            status: new_resource.status,
            contact_email: new_resource.contact_email,
            contact_phone: new_resource.contact_phone,
            hourly_cost: new_resource.hourly_cost,
            capacity: new_resource.capacity,
            is_active: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = self.repo.create(&scope, &resource).await?;

        tracing::info!(id = %created.id, tenant_id = %ctx.tenant_id, "Created resource");
        self.audit.record(
            AuditEvent::new(ctx, Operation::Create, Entity::Resource, Some(created.id))
                .with_detail(json!({ "name": created.name, "resource_type": created.resource_type })),
        );
        Ok(created)
    }

    pub async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        req: UpdateResourceRequest,
    ) -> Result<Resource, ApiError> {
        let patch = validate_update_resource(req)?;
        let scope = ctx.scope();
        let existing = self.get(ctx, id).await?;
        if !existing.is_active {
            return Err(ApiError::conflict(format!(
                "resource {} is deleted; restore it before updating",
                id
            )));
        }

        let mut next = existing.clone();
        patch.apply_to(&mut next);
        if next == existing {
            return Ok(existing);
        }
        next.updated_at = Utc::now();
        let updated = self.repo.update(&scope, &next).await?;

        self.audit.record(AuditEvent::new(ctx, Operation::Update, Entity::Resource, Some(updated.id)));
        Ok(updated)
    }

    pub async fn delete(&self, ctx: &TenantContext, id: Uuid) -> Result<Resource, ApiError> {
        self.set_active(ctx, id, false).await
    }

    pub async fn restore(&self, ctx: &TenantContext, id: Uuid) -> Result<Resource, ApiError> {
        self.set_active(ctx, id, true).await
    }

    async fn set_active(&self, ctx: &TenantContext, id: Uuid, active: bool) -> Result<Resource, ApiError> {
        let existing = self.get(ctx, id).await?;
        if existing.is_active == active {
            return Ok(existing);
        }

        let updated = self.repo.set_active(&ctx.scope(), id, active, Utc::now()).await?;
        let action = if active { Operation::Restore } else { Operation::Delete };
        self.audit.record(AuditEvent::new(ctx, action, Entity::Resource, Some(updated.id)));
        Ok(updated)
    }
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::not_found(format!("resource {} not found", id))
}
