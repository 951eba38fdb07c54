use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::parse_param;
use crate::api::AppState;
use crate::config::FilterConfig;
use crate::error::ApiError;
use crate::filter::{text_filter, CatalogItemQuery, Pagination, SortSpec};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{
    CatalogItem, CreateCatalogItemRequest, LinkResourceRequest, LinkedResource, Page,
    UpdateCatalogItemRequest,
};
use crate::services::ImageUpload;
use crate::tenancy::TenantContext;
use crate::validation::ValidationErrors;

/// Query string of `GET /api/v1/catalog-items`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCatalogItemsParams {
    /// Case-insensitive match on name, description and SKU
    pub search: Option<String>,
    pub item_type: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    /// Also list soft-deleted items
    pub include_inactive: Option<bool>,
    /// e.g. `unit_price:desc,name`
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListCatalogItemsParams {
    pub fn into_query(self, config: &FilterConfig) -> Result<CatalogItemQuery, ApiError> {
        let mut errors = ValidationErrors::new();
        let item_type = parse_param(&mut errors, "item_type", self.item_type.as_deref());
        let status = parse_param(&mut errors, "status", self.status.as_deref());
        let min_price = parse_param(&mut errors, "min_price", self.min_price.as_deref());
        let max_price = parse_param(&mut errors, "max_price", self.max_price.as_deref());
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let sort = match self.sort.as_deref() {
            Some(raw) => SortSpec::parse_list(raw, CatalogItemQuery::sortable())?,
            None => vec![],
        };
        Ok(CatalogItemQuery {
            search: text_filter(self.search),
            item_type,
            status,
            category: text_filter(self.category),
            min_price,
            max_price,
            include_inactive: self.include_inactive.unwrap_or(false),
            sort,
            pagination: Pagination::new(self.page, self.per_page, config)?,
        })
    }
}

/// Multipart form of the image upload
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadImageForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog-items",
    tag = "catalog-items",
    params(ListCatalogItemsParams),
    responses(
        (status = 200, description = "Current versions matching the filter", body = CatalogItemPage),
        (status = 400, description = "Invalid filter, sort or pagination"),
    ),
    security(("bearer" = []))
)]
pub async fn list_catalog_items(
    State(state): State<AppState>,
    ctx: TenantContext,
    params: Result<Query<ListCatalogItemsParams>, QueryRejection>,
) -> ApiResult<Page<CatalogItem>> {
    let Query(params) = params?;
    let query = params.into_query(&state.config.filter)?;
    let page = state.services.catalog.list_items(&ctx, &query).await?;
    Ok(ApiResponse::success(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/catalog-items",
    tag = "catalog-items",
    request_body = CreateCatalogItemRequest,
    responses(
        (status = 201, description = "Version 1 of a new item", body = CatalogItem),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer" = []))
)]
pub async fn create_catalog_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    body: Result<Json<CreateCatalogItemRequest>, JsonRejection>,
) -> ApiResult<CatalogItem> {
    let Json(req) = body?;
    let item = state.services.catalog.create_item(&ctx, req).await?;
    Ok(ApiResponse::created(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog-items/{id}",
    tag = "catalog-items",
    params(("id" = Uuid, Path, description = "Id of any version")),
    responses(
        (status = 200, description = "The version", body = CatalogItem),
        (status = 404, description = "Unknown in this tenant and environment"),
    ),
    security(("bearer" = []))
)]
pub async fn get_catalog_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<CatalogItem> {
    let Path(id) = id?;
    let item = state.services.catalog.get_item(&ctx, id).await?;
    Ok(ApiResponse::success(item))
}

#[utoipa::path(
    put,
    path = "/api/v1/catalog-items/{id}",
    tag = "catalog-items",
    params(("id" = Uuid, Path, description = "Id of the current version")),
    request_body = UpdateCatalogItemRequest,
    responses(
        (status = 200, description = "The new current version, or the unchanged one", body = CatalogItem),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Superseded, deleted or concurrently modified"),
    ),
    security(("bearer" = []))
)]
pub async fn update_catalog_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateCatalogItemRequest>, JsonRejection>,
) -> ApiResult<CatalogItem> {
    let Path(id) = id?;
    let Json(req) = body?;
    let item = state.services.catalog.update_item(&ctx, id, req).await?;
    Ok(ApiResponse::success(item))
}

#[utoipa::path(
    delete,
    path = "/api/v1/catalog-items/{id}",
    tag = "catalog-items",
    params(("id" = Uuid, Path, description = "Id of any version of the item")),
    responses(
        (status = 200, description = "Soft-deleted current version", body = CatalogItem),
        (status = 404, description = "Not found"),
    ),
    security(("bearer" = []))
)]
pub async fn delete_catalog_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<CatalogItem> {
    let Path(id) = id?;
    let item = state.services.catalog.delete_item(&ctx, id).await?;
    Ok(ApiResponse::success(item))
}

#[utoipa::path(
    post,
    path = "/api/v1/catalog-items/{id}/restore",
    tag = "catalog-items",
    params(("id" = Uuid, Path, description = "Id of any version of the item")),
    responses(
        (status = 200, description = "Restored current version", body = CatalogItem),
        (status = 404, description = "Not found"),
    ),
    security(("bearer" = []))
)]
pub async fn restore_catalog_item(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<CatalogItem> {
    let Path(id) = id?;
    let item = state.services.catalog.restore_item(&ctx, id).await?;
    Ok(ApiResponse::success(item))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog-items/{id}/versions",
    tag = "catalog-items",
    params(("id" = Uuid, Path, description = "Id of any version")),
    responses(
        (status = 200, description = "The whole chain, oldest first", body = [CatalogItem]),
        (status = 404, description = "Not found"),
    ),
    security(("bearer" = []))
)]
pub async fn list_catalog_item_versions(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Vec<CatalogItem>> {
    let Path(id) = id?;
    let versions = state.services.catalog.item_versions(&ctx, id).await?;
    Ok(ApiResponse::success(versions))
}

#[utoipa::path(
    get,
    path = "/api/v1/catalog-items/{id}/resources",
    tag = "catalog-items",
    params(("id" = Uuid, Path, description = "Id of any version")),
    responses(
        (status = 200, description = "Resources linked to that version", body = [LinkedResource]),
        (status = 404, description = "Not found"),
    ),
    security(("bearer" = []))
)]
pub async fn list_catalog_item_resources(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Vec<LinkedResource>> {
    let Path(id) = id?;
    let linked = state.services.catalog.item_resources(&ctx, id).await?;
    Ok(ApiResponse::success(linked))
}

#[utoipa::path(
    post,
    path = "/api/v1/catalog-items/{id}/resources",
    tag = "catalog-items",
    params(("id" = Uuid, Path, description = "Id of any version; the link attaches to the current one")),
    request_body = LinkResourceRequest,
    responses(
        (status = 201, description = "Link created", body = LinkedResource),
        (status = 404, description = "Item or resource not found"),
        (status = 409, description = "Already linked, or the item is deleted"),
    ),
    security(("bearer" = []))
)]
pub async fn link_catalog_item_resource(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<LinkResourceRequest>, JsonRejection>,
) -> ApiResult<LinkedResource> {
    let Path(id) = id?;
    let Json(req) = body?;
    let linked = state.services.catalog.link_resource(&ctx, id, req).await?;
    Ok(ApiResponse::created(linked))
}

#[utoipa::path(
    delete,
    path = "/api/v1/catalog-items/{id}/resources/{resource_id}",
    tag = "catalog-items",
    params(
        ("id" = Uuid, Path, description = "Id of any version"),
        ("resource_id" = Uuid, Path, description = "Linked resource"),
    ),
    responses(
        (status = 204, description = "Link removed from the current version"),
        (status = 404, description = "No such link"),
    ),
    security(("bearer" = []))
)]
pub async fn unlink_catalog_item_resource(
    State(state): State<AppState>,
    ctx: TenantContext,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<()> {
    let Path((id, resource_id)) = ids?;
    state.services.catalog.unlink_resource(&ctx, id, resource_id).await?;
    Ok(ApiResponse::with_status((), StatusCode::NO_CONTENT))
}

#[utoipa::path(
    post,
    path = "/api/v1/catalog-items/{id}/image",
    tag = "catalog-items",
    params(("id" = Uuid, Path, description = "Id of the current version")),
    request_body(content = UploadImageForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored and recorded as a new version", body = ImageUpload),
        (status = 400, description = "Missing file, unsupported type or too large"),
        (status = 409, description = "Superseded or deleted"),
        (status = 502, description = "Storage provider failed"),
    ),
    security(("bearer" = []))
)]
pub async fn upload_catalog_item_image(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ImageUpload> {
    let Path(id) = id?;
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let upload = state
            .services
            .catalog
            .upload_item_image(&ctx, id, content_type.as_deref(), bytes.to_vec())
            .await?;
        return Ok(ApiResponse::created(upload));
    }
    Err(ValidationErrors::single("file", "is required").into())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Uploaded file is too large")
    } else {
        ApiError::bad_request(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::filter::SortDirection;
    use crate::models::ItemType;
    use rust_decimal::Decimal;

    #[test]
    fn query_string_becomes_typed_query() {
        let params = ListCatalogItemsParams {
            item_type: Some("SERVICE".into()),
            min_price: Some("10".into()),
            sort: Some("unitPrice:desc".into()),
            search: Some("  ".into()),
            ..Default::default()
        };
        let query = params.into_query(&AppConfig::development().filter).unwrap();
        assert_eq!(query.item_type, Some(ItemType::Service));
        assert_eq!(query.min_price, Some(Decimal::from(10)));
        assert_eq!(query.sort[0].field, "unit_price");
        assert_eq!(query.sort[0].direction, SortDirection::Desc);
        assert_eq!(query.search, None);
    }

    #[test]
    fn bad_params_are_field_errors() {
        let params = ListCatalogItemsParams {
            item_type: Some("subscription".into()),
            max_price: Some("lots".into()),
            ..Default::default()
        };
        let err = params.into_query(&AppConfig::development().filter).unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains_key("item_type"));
        assert!(fields.contains_key("max_price"));
    }
}
