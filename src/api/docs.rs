use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::protected::{catalog_items, notifications, resources};
use crate::models::{
    CatalogItem, CatalogItemPage, CatalogItemResource, CreateCatalogItemRequest, CreateResourceRequest,
    DataEnvironment, ItemStatus, ItemType, LinkResourceRequest, LinkedResource, PricingType, Resource,
    ResourcePage, ResourceStatus, ResourceType, UpdateCatalogItemRequest, UpdateResourceRequest,
};
use crate::notify::{DeliveryReceipt, SendWhatsAppRequest};
use crate::services::ImageUpload;
use crate::storage::StoredObject;

#[derive(OpenApi)]
#[openapi(
    info(title = "Service Catalog API", description = "Multi-tenant catalog of services and resources"),
    paths(
        catalog_items::list_catalog_items,
        catalog_items::create_catalog_item,
        catalog_items::get_catalog_item,
        catalog_items::update_catalog_item,
        catalog_items::delete_catalog_item,
        catalog_items::restore_catalog_item,
        catalog_items::list_catalog_item_versions,
        catalog_items::list_catalog_item_resources,
        catalog_items::link_catalog_item_resource,
        catalog_items::unlink_catalog_item_resource,
        catalog_items::upload_catalog_item_image,
        resources::list_resources,
        resources::create_resource,
        resources::get_resource,
        resources::update_resource,
        resources::delete_resource,
        resources::restore_resource,
        notifications::send_whatsapp,
    ),
    components(schemas(
        CatalogItem,
        CatalogItemPage,
        CreateCatalogItemRequest,
        UpdateCatalogItemRequest,
        Resource,
        ResourcePage,
        CreateResourceRequest,
        UpdateResourceRequest,
        CatalogItemResource,
        LinkedResource,
        LinkResourceRequest,
        ImageUpload,
        StoredObject,
        catalog_items::UploadImageForm,
        SendWhatsAppRequest,
        DeliveryReceipt,
        ItemType,
        PricingType,
        ItemStatus,
        ResourceType,
        ResourceStatus,
        DataEnvironment,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "catalog-items", description = "Versioned catalog items"),
        (name = "resources", description = "Staff, equipment and other resources"),
        (name = "notifications", description = "WhatsApp template messages"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}
