use async_graphql::{Context, Object};
use uuid::Uuid;

use super::types::{
    CatalogItemFilterInput, CatalogItemPage, CatalogItemSortInput, ResourceFilterInput, ResourcePage,
    ResourceSortInput,
};
use super::{services, tenant, GraphqlResultExt};
use crate::config::FilterConfig;
use crate::models::{CatalogItem, Resource};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Current versions only; deleted items need `includeInactive`
    async fn catalog_items(
        &self,
        ctx: &Context<'_>,
        filter: Option<CatalogItemFilterInput>,
        sort: Option<Vec<CatalogItemSortInput>>,
        page: Option<i32>,
        per_page: Option<i32>,
    ) -> async_graphql::Result<CatalogItemPage> {
        let tenant = tenant(ctx)?;
        let query = filter
            .unwrap_or_default()
            .into_query(sort.unwrap_or_default(), page, per_page, ctx.data::<FilterConfig>()?)
            .extended()?;
        let page = services(ctx)?.catalog.list_items(tenant, &query).await.extended()?;
        Ok(page.into())
    }

    /// Any version by id
    async fn catalog_item(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<CatalogItem> {
        services(ctx)?.catalog.get_item(tenant(ctx)?, id).await.extended()
    }

    async fn catalog_item_versions(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<Vec<CatalogItem>> {
        services(ctx)?.catalog.item_versions(tenant(ctx)?, id).await.extended()
    }

    async fn resources(
        &self,
        ctx: &Context<'_>,
        filter: Option<ResourceFilterInput>,
        sort: Option<Vec<ResourceSortInput>>,
        page: Option<i32>,
        per_page: Option<i32>,
    ) -> async_graphql::Result<ResourcePage> {
        let tenant = tenant(ctx)?;
        let query = filter
            .unwrap_or_default()
            .into_query(sort.unwrap_or_default(), page, per_page, ctx.data::<FilterConfig>()?)
            .extended()?;
        let page = services(ctx)?.resources.list(tenant, &query).await.extended()?;
        Ok(page.into())
    }

    async fn resource(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<Resource> {
        services(ctx)?.resources.get(tenant(ctx)?, id).await.extended()
    }
}
