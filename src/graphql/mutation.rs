use async_graphql::{Context, Object};
use uuid::Uuid;

use super::{services, tenant, GraphqlResultExt};
use crate::models::{
    CatalogItem, CreateCatalogItemRequest, CreateResourceRequest, LinkResourceRequest, LinkedResource, Resource,
    UpdateCatalogItemRequest, UpdateResourceRequest,
};
use crate::notify::{DeliveryReceipt, SendWhatsAppRequest};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_catalog_item(
        &self,
        ctx: &Context<'_>,
        input: CreateCatalogItemRequest,
    ) -> async_graphql::Result<CatalogItem> {
        services(ctx)?.catalog.create_item(tenant(ctx)?, input).await.extended()
    }

    /// Returns the new current version
    async fn update_catalog_item(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateCatalogItemRequest,
    ) -> async_graphql::Result<CatalogItem> {
        services(ctx)?.catalog.update_item(tenant(ctx)?, id, input).await.extended()
    }

    async fn delete_catalog_item(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<CatalogItem> {
        services(ctx)?.catalog.delete_item(tenant(ctx)?, id).await.extended()
    }

    async fn restore_catalog_item(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<CatalogItem> {
        services(ctx)?.catalog.restore_item(tenant(ctx)?, id).await.extended()
    }

    async fn link_resource(
        &self,
        ctx: &Context<'_>,
        catalog_item_id: Uuid,
        input: LinkResourceRequest,
    ) -> async_graphql::Result<LinkedResource> {
        services(ctx)?
            .catalog
            .link_resource(tenant(ctx)?, catalog_item_id, input)
            .await
            .extended()
    }

    async fn unlink_resource(
        &self,
        ctx: &Context<'_>,
        catalog_item_id: Uuid,
        resource_id: Uuid,
    ) -> async_graphql::Result<bool> {
        services(ctx)?
            .catalog
            .unlink_resource(tenant(ctx)?, catalog_item_id, resource_id)
            .await
            .extended()?;
        Ok(true)
    }

    async fn create_resource(&self, ctx: &Context<'_>, input: CreateResourceRequest) -> async_graphql::Result<Resource> {
        services(ctx)?.resources.create(tenant(ctx)?, input).await.extended()
    }

    async fn update_resource(
        &self,
        ctx: &Context<'_>,
        id: Uuid,
        input: UpdateResourceRequest,
    ) -> async_graphql::Result<Resource> {
        services(ctx)?.resources.update(tenant(ctx)?, id, input).await.extended()
    }

    async fn delete_resource(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<Resource> {
        services(ctx)?.resources.delete(tenant(ctx)?, id).await.extended()
    }

    async fn restore_resource(&self, ctx: &Context<'_>, id: Uuid) -> async_graphql::Result<Resource> {
        services(ctx)?.resources.restore(tenant(ctx)?, id).await.extended()
    }

    #[graphql(name = "sendWhatsApp")]
    async fn send_whatsapp(
        &self,
        ctx: &Context<'_>,
        input: SendWhatsAppRequest,
    ) -> async_graphql::Result<DeliveryReceipt> {
        services(ctx)?.notifications.send_whatsapp(tenant(ctx)?, input).await.extended()
    }
}
