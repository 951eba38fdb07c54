use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::database::repository::CatalogRepository;
use crate::filter::tables::{CATALOG_ITEMS, RESOURCES};
use crate::filter::{CatalogItemQuery, FilterData};
use crate::models::{
    CatalogItem, CatalogItemResource, CatalogItemRow, LinkedResource, NewResourceLink, Page, Resource, ResourceRow,
};
use crate::tenancy::TenantScope;
use crate::versioning::VersionError;

const INSERT_ITEM: &str = r#"
    INSERT INTO catalog_items (
        id, tenant_id, is_live, original_id, parent_id, version_number, is_current_version,
        name, description, item_type, category, sku, pricing_type, unit_price, currency,
        tax_rate, duration_minutes, image_url, status, is_active, created_by,
        created_at, updated_at, deleted_at
    ) VALUES (
        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
        $17, $18, $19, $20, $21, $22, $23, $24
    )
    RETURNING *
"#;

const SUPERSEDE_PARENT: &str = r#"
    UPDATE catalog_items
       SET is_current_version = FALSE
     WHERE id = $1 AND tenant_id = $2 AND is_live = $3 AND is_current_version = TRUE
"#;

const COPY_LINKS: &str = r#"
    INSERT INTO catalog_item_resources
        (id, tenant_id, is_live, catalog_item_id, resource_id, quantity, is_required, created_at)
    SELECT gen_random_uuid(), tenant_id, is_live, $1, resource_id, quantity, is_required, created_at
      FROM catalog_item_resources
     WHERE catalog_item_id = $2 AND tenant_id = $3 AND is_live = $4
"#;

pub struct PgCatalogRepository {
    pool: PgPool,
    max_limit: u32,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool, max_limit: u32) -> Self {
        Self { pool, max_limit }
    }

    fn scoped(scope: &TenantScope, mut conditions: serde_json::Value) -> FilterData {
        conditions["tenant_id"] = json!(scope.tenant_id.to_string());
        conditions["is_live"] = json!(scope.is_live);
        FilterData { where_clause: Some(conditions), ..Default::default() }
    }

    async fn fetch_resource(&self, scope: &TenantScope, id: Uuid) -> Result<Option<Resource>, DatabaseError> {
        QueryBuilder::<ResourceRow>::new(&RESOURCES)
            .filter(Self::scoped(scope, json!({ "id": id.to_string() })))?
            .select_optional(&self.pool)
            .await?
            .map(Resource::try_from)
            .transpose()
    }
}

async fn insert_item<'e, E: PgExecutor<'e>>(executor: E, item: &CatalogItem) -> Result<CatalogItemRow, sqlx::Error> {
    sqlx::query_as(INSERT_ITEM)
        .bind(item.id)
        .bind(item.tenant_id)
        .bind(item.is_live)
        .bind(item.original_id)
        .bind(item.parent_id)
        .bind(item.version_number)
        .bind(item.is_current_version)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.item_type.as_str())
        .bind(&item.category)
        .bind(&item.sku)
        .bind(item.pricing_type.as_str())
        .bind(item.unit_price)
        .bind(&item.currency)
        .bind(item.tax_rate)
        .bind(item.duration_minutes)
        .bind(&item.image_url)
        .bind(item.status.as_str())
        .bind(item.is_active)
        .bind(item.created_by)
        .bind(item.created_at)
        .bind(item.updated_at)
        .bind(item.deleted_at)
        .fetch_one(executor)
        .await
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list(&self, scope: &TenantScope, query: &CatalogItemQuery) -> Result<Page<CatalogItem>, DatabaseError> {
        let builder = QueryBuilder::<CatalogItemRow>::new(&CATALOG_ITEMS)
            .max_limit(self.max_limit)
            .filter(query.to_filter_data(scope))?;

        let (rows, total) = futures::try_join!(builder.select_all(&self.pool), builder.count(&self.pool))?;
        let items = rows
            .into_iter()
            .map(CatalogItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, query.pagination.page, query.pagination.per_page))
    }

    async fn get(&self, scope: &TenantScope, id: Uuid) -> Result<Option<CatalogItem>, DatabaseError> {
        QueryBuilder::<CatalogItemRow>::new(&CATALOG_ITEMS)
            .filter(Self::scoped(scope, json!({ "id": id.to_string() })))?
            .select_optional(&self.pool)
            .await?
            .map(CatalogItem::try_from)
            .transpose()
    }

    async fn get_current(&self, scope: &TenantScope, original_id: Uuid) -> Result<Option<CatalogItem>, DatabaseError> {
        QueryBuilder::<CatalogItemRow>::new(&CATALOG_ITEMS)
            .filter(Self::scoped(
                scope,
                json!({ "original_id": original_id.to_string(), "is_current_version": true }),
            ))?
            .select_optional(&self.pool)
            .await?
            .map(CatalogItem::try_from)
            .transpose()
    }

    async fn create(&self, scope: &TenantScope, item: &CatalogItem) -> Result<CatalogItem, DatabaseError> {
        if !scope.owns(item.tenant_id, item.is_live) {
            return Err(DatabaseError::QueryError("catalog item outside caller scope".to_string()));
        }
        let row = insert_item(&self.pool, item)
            .await
            .map_err(|e| DatabaseError::conflict_on_unique(e, "catalog item already exists"))?;
        CatalogItem::try_from(row)
    }

    async fn create_version(
        &self,
        scope: &TenantScope,
        parent_id: Uuid,
        next: &CatalogItem,
    ) -> Result<CatalogItem, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let superseded = sqlx::query(SUPERSEDE_PARENT)
            .bind(parent_id)
            .bind(scope.tenant_id)
            .bind(scope.is_live)
            .execute(&mut *tx)
            .await?;
        if superseded.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(VersionError::Stale { parent_id }.into());
        }

        let created = match insert_item(&mut *tx, next).await {
            Ok(row) => CatalogItem::try_from(row)?,
            // A concurrent writer created the same successor first
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tx.rollback().await?;
                return Err(VersionError::Stale { parent_id }.into());
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query(COPY_LINKS)
            .bind(created.id)
            .bind(parent_id)
            .bind(scope.tenant_id)
            .bind(scope.is_live)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(
            original_id = %created.original_id,
            version = created.version_number,
            "Created catalog item version"
        );
        Ok(created)
    }

    async fn set_active(
        &self,
        scope: &TenantScope,
        id: Uuid,
        active: bool,
        now: DateTime<Utc>,
    ) -> Result<CatalogItem, DatabaseError> {
        let row: Option<CatalogItemRow> = sqlx::query_as(
            r#"
            UPDATE catalog_items
               SET is_active = $1,
                   deleted_at = CASE WHEN $1 THEN NULL ELSE $2 END,
                   updated_at = $2
             WHERE id = $3 AND tenant_id = $4 AND is_live = $5 AND is_current_version = TRUE
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
            Some(row) => CatalogItem::try_from(row),
            // Superseded between the caller's read and this write
            None if self.get(scope, id).await?.is_some() => Err(VersionError::Stale { parent_id: id }.into()),
            None => Err(DatabaseError::NotFound(format!("catalog item {}", id))),
        }
    }

    async fn versions(&self, scope: &TenantScope, id: Uuid) -> Result<Vec<CatalogItem>, DatabaseError> {
        let Some(member) = self.get(scope, id).await? else {
            return Ok(vec![]);
        };
        let mut filter = Self::scoped(scope, json!({ "original_id": member.original_id.to_string() }));
        filter.order = Some(json!("version_number asc"));

        QueryBuilder::<CatalogItemRow>::new(&CATALOG_ITEMS)
            .filter(filter)?
            .select_all(&self.pool)
            .await?
            .into_iter()
            .map(CatalogItem::try_from)
            .collect()
    }

    async fn linked_resources(
        &self,
        scope: &TenantScope,
        catalog_item_id: Uuid,
    ) -> Result<Vec<LinkedResource>, DatabaseError> {
        let links: Vec<CatalogItemResource> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, is_live, catalog_item_id, resource_id, quantity, is_required, created_at
              FROM catalog_item_resources
             WHERE catalog_item_id = $1 AND tenant_id = $2 AND is_live = $3
             ORDER BY created_at, id
            "#,
        )
        .bind(catalog_item_id)
        .bind(scope.tenant_id)
        .bind(scope.is_live)
        .fetch_all(&self.pool)
        .await?;
        if links.is_empty() {
            return Ok(vec![]);
        }

        let ids: Vec<String> = links.iter().map(|l| l.resource_id.to_string()).collect();
        let resources = QueryBuilder::<ResourceRow>::new(&RESOURCES)
            .filter(Self::scoped(scope, json!({ "id": { "$in": ids } })))?
            .select_all(&self.pool)
            .await?
            .into_iter()
            .map(Resource::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links
            .into_iter()
            .filter_map(|link| {
                let resource = resources.iter().find(|r| r.id == link.resource_id)?.clone();
                Some(LinkedResource { link, resource })
            })
            .collect())
    }

    async fn link_resource(
        &self,
        scope: &TenantScope,
        catalog_item_id: Uuid,
        link: &NewResourceLink,
    ) -> Result<LinkedResource, DatabaseError> {
        let resource = self
            .fetch_resource(scope, link.resource_id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", link.resource_id)))?;
        if !resource.is_active {
            return Err(DatabaseError::Conflict(format!("resource {} is deleted", resource.id)));
        }

        let created: CatalogItemResource = sqlx::query_as(
            r#"
            INSERT INTO catalog_item_resources
                (id, tenant_id, is_live, catalog_item_id, resource_id, quantity, is_required, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, tenant_id, is_live, catalog_item_id, resource_id, quantity, is_required, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(scope.tenant_id)
        .bind(scope.is_live)
        .bind(catalog_item_id)
        .bind(link.resource_id)
        .bind(link.quantity)
        .bind(link.is_required)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::conflict_on_unique(e, "resource is already linked to this catalog item"))?;

        Ok(LinkedResource { link: created, resource })
    }

    async fn unlink_resource(
        &self,
        scope: &TenantScope,
        catalog_item_id: Uuid,
        resource_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            DELETE FROM catalog_item_resources
             WHERE catalog_item_id = $1 AND resource_id = $2 AND tenant_id = $3 AND is_live = $4
            "#,
        )
        .bind(catalog_item_id)
        .bind(resource_id)
        .bind(scope.tenant_id)
        .bind(scope.is_live)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
