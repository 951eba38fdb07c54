pub mod catalog_item;
pub mod enums;
pub mod page;
pub mod resource;

pub use catalog_item::{
    CatalogItem, CatalogItemPatch, CatalogItemRow, CreateCatalogItemRequest, NewCatalogItem,
    UpdateCatalogItemRequest,
};
pub use enums::{DataEnvironment, ItemStatus, ItemType, PricingType, ResourceStatus, ResourceType};
pub use page::{CatalogItemPage, Page, ResourcePage};
pub use resource::{
    CatalogItemResource, CreateResourceRequest, LinkResourceRequest, LinkedResource, NewResource,
    NewResourceLink, Resource, ResourcePatch, ResourceRow, UpdateResourceRequest,
};
