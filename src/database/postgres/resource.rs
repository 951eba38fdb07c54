use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::database::repository::ResourceRepository;
use crate::filter::tables::RESOURCES;
use crate::filter::{FilterData, ResourceQuery};
use crate::models::{Page, Resource, ResourceRow};
use crate::tenancy::TenantScope;

pub struct PgResourceRepository {
    pool: PgPool,
    max_limit: u32,
}

impl PgResourceRepository {
    pub fn new(pool: PgPool, max_limit: u32) -> Self {
        Self { pool, max_limit }
    }
}

#[async_trait]
impl ResourceRepository for PgResourceRepository {
    async fn list(&self, scope: &TenantScope, query: &ResourceQuery) -> Result<Page<Resource>, DatabaseError> {
        let builder = QueryBuilder::<ResourceRow>::new(&RESOURCES)
            .max_limit(self.max_limit)
            .filter(query.to_filter_data(scope))?;

        let (rows, total) = futures::try_join!(builder.select_all(&self.pool), builder.count(&self.pool))?;
        let items = rows
            .into_iter()
            .map(Resource::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, query.pagination.page, query.pagination.per_page))
    }

    async fn get(&self, scope: &TenantScope, id: Uuid) -> Result<Option<Resource>, DatabaseError> {
        let filter = FilterData {
            where_clause: Some(json!({
                "id": id.to_string(),
                "tenant_id": scope.tenant_id.to_string(),
                "is_live": scope.is_live,
            })),
            ..Default::default()
        };
        QueryBuilder::<ResourceRow>::new(&RESOURCES)
            .filter(filter)?
            .select_optional(&self.pool)
            .await?
            .map(Resource::try_from)
            .transpose()
    }

    async fn create(&self, scope: &TenantScope, resource: &Resource) -> Result<Resource, DatabaseError> {
        if !scope.owns(resource.tenant_id, resource.is_live) {
            return Err(DatabaseError::QueryError("resource outside caller scope".to_string()));
        }
        let row: ResourceRow = sqlx::query_as(
            r#"
            INSERT INTO resources (
                id, tenant_id, is_live, name, description, resource_type, status,
                contact_email, contact_phone, hourly_cost, capacity, is_active,
                created_at, updated_at, deleted_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(resource.id)
        .bind(resource.tenant_id)
        .bind(resource.is_live)
        .bind(&resource.name)
        .bind(&resource.description)
        .bind(resource.resource_type.as_str())
        .bind(resource.status.as_str())
        .bind(&resource.contact_email)
        .bind(&resource.contact_phone)
        .bind(resource.hourly_cost)
        .bind(resource.capacity)
        .bind(resource.is_active)
        .bind(resource.created_at)
        .bind(resource.updated_at)
        .bind(resource.deleted_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::conflict_on_unique(e, "resource already exists"))?;
        Resource::try_from(row)
    }

    async fn update(&self, scope: &TenantScope, resource: &Resource) -> Result<Resource, DatabaseError> {
        let row: Option<ResourceRow> = sqlx::query_as(
            r#"
            UPDATE resources
               SET name = $1, description = $2, resource_type = $3, status = $4,
                   contact_email = $5, contact_phone = $6, hourly_cost = $7, capacity = $8,
                   updated_at = $9
             WHERE id = $10 AND tenant_id = $11 AND is_live = $12
            RETURNING *
            "#,
        )
        .bind(&resource.name)
        .bind(&resource.description)
        .bind(resource.resource_type.as_str())
        .bind(resource.status.as_str())
        .bind(&resource.contact_email)
        .bind(&resource.contact_phone)
        .bind(resource.hourly_cost)
        .bind(resource.capacity)
        .bind(resource.updated_at)
        .bind(resource.id)
        .bind(scope.tenant_id)
        .bind(scope.is_live)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Resource::try_from(row),
            None => Err(DatabaseError::NotFound(format!("resource {}", resource.id))),
        }
    }

    async fn set_active(
        &self,
        scope: &TenantScope,
        id: Uuid,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<Resource, DatabaseError> {
        let row: Option<ResourceRow> = sqlx::query_as(
            r#"
            UPDATE resources
               SET is_active = $1,
                   deleted_at = CASE WHEN $1 THEN NULL ELSE $2 END,
                   updated_at = $2
             WHERE id = $3 AND tenant_id = $4 AND is_live = $5
            RETURNING *
            "#,
        )
        .bind(active)
        .bind(now)
        .bind(id)
        .bind(scope.tenant_id)
        .bind(scope.is_live)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Resource::try_from(row),
            None => Err(DatabaseError::NotFound(format!("resource {}", id))),
        }
    }
}
