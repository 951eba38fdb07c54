use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::parse_param;
use crate::api::AppState;
use crate::config::FilterConfig;
use crate::error::ApiError;
use crate::filter::{text_filter, Pagination, ResourceQuery, SortSpec};
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{CreateResourceRequest, Page, Resource, UpdateResourceRequest};
use crate::tenancy::TenantContext;
use crate::validation::ValidationErrors;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListResourcesParams {
    /// Case-insensitive match on name and description
    pub search: Option<String>,
    pub resource_type: Option<String>,
    pub status: Option<String>,
    pub include_inactive: Option<bool>,
    /// e.g. `hourly_cost:desc,name`
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListResourcesParams {
    pub fn into_query(self, config: &FilterConfig) -> Result<ResourceQuery, ApiError> {
        let mut errors = ValidationErrors::new();
        let resource_type = parse_param(&mut errors, "resource_type", self.resource_type.as_deref());
        let status = parse_param(&mut errors, "status", self.status.as_deref());
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let sort = match self.sort.as_deref() {
            Some(raw) => SortSpec::parse_list(raw, ResourceQuery::sortable())?,
            None => vec![],
        };
        Ok(ResourceQuery {
            search: text_filter(self.search),
            resource_type,
            status,
            include_inactive: self.include_inactive.unwrap_or(false),
            sort,
            pagination: Pagination::new(self.page, self.per_page, config)?,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/resources",
    tag = "resources",
    params(ListResourcesParams),
    responses(
        (status = 200, description = "Resources matching the filter", body = ResourcePage),
        (status = 400, description = "Invalid filter, sort or pagination"),
    ),
    security(("bearer" = []))
)]
pub async fn list_resources(
    State(state): State<AppState>,
    ctx: TenantContext,
    params: Result<Query<ListResourcesParams>, QueryRejection>,
) -> ApiResult<Page<Resource>> {
    let Query(params) = params?;
    let query = params.into_query(&state.config.filter)?;
    let page = state.services.resources.list(&ctx, &query).await?;
    Ok(ApiResponse::success(page))
}

#[utoipa::path(
    post,
    path = "/api/v1/resources",
    tag = "resources",
    request_body = CreateResourceRequest,
    responses(
        (status = 201, description = "Resource created", body = Resource),
        (status = 400, description = "Validation failed"),
    ),
    security(("bearer" = []))
)]
pub async fn create_resource(
    State(state): State<AppState>,
    ctx: TenantContext,
    body: Result<Json<CreateResourceRequest>, JsonRejection>,
) -> ApiResult<Resource> {
    let Json(req) = body?;
    let resource = state.services.resources.create(&ctx, req).await?;
    Ok(ApiResponse::created(resource))
}

#[utoipa::path(
    get,
    path = "/api/v1/resources/{id}",
    tag = "resources",
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 200, description = "The resource", body = Resource),
        (status = 404, description = "Not found"),
    ),
    security(("bearer" = []))
)]
pub async fn get_resource(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Resource> {
    let Path(id) = id?;
    let resource = state.services.resources.get(&ctx, id).await?;
    Ok(ApiResponse::success(resource))
}

#[utoipa::path(
    put,
    path = "/api/v1/resources/{id}",
    tag = "resources",
    params(("id" = Uuid, Path, description = "Resource id")),
    request_body = UpdateResourceRequest,
    responses(
        (status = 200, description = "Updated in place", body = Resource),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Resource is deleted"),
    ),
    security(("bearer" = []))
)]
pub async fn update_resource(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateResourceRequest>, JsonRejection>,
) -> ApiResult<Resource> {
    let Path(id) = id?;
    let Json(req) = body?;
    let resource = state.services.resources.update(&ctx, id, req).await?;
    Ok(ApiResponse::success(resource))
}

#[utoipa::path(
    delete,
    path = "/api/v1/resources/{id}",
    tag = "resources",
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Soft-deleted resource", body = Resource),
        (status = 404, description = "Not found"),
    ),
    security(("bearer" = []))
)]
pub async fn delete_resource(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Resource> {
    let Path(id) = id?;
    let resource = state.services.resources.delete(&ctx, id).await?;
    Ok(ApiResponse::success(resource))
}

#[utoipa::path(
    post,
    path = "/api/v1/resources/{id}/restore",
    tag = "resources",
    params(("id" = Uuid, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Restored resource", body = Resource),
        (status = 404, description = "Not found"),
    ),
    security(("bearer" = []))
)]
pub async fn restore_resource(
    State(state): State<AppState>,
    ctx: TenantContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Resource> {
    let Path(id) = id?;
    let resource = state.services.resources.restore(&ctx, id).await?;
    Ok(ApiResponse::success(resource))
}
