use async_graphql::http::GraphiQLSource;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Html,
    Json,
};

use crate::api::AppState;
use crate::error::ApiError;
use crate::tenancy::TenantContext;

/// POST /graphql - the tenant context travels as request data
pub async fn graphql_handler(
    State(state): State<AppState>,
    ctx: TenantContext,
    body: Result<Json<async_graphql::Request>, JsonRejection>,
) -> Result<Json<async_graphql::Response>, ApiError> {
    let Json(request) = body?;
    Ok(Json(state.schema.execute(request.data(ctx)).await))
}

/// GET /graphql - interactive explorer, no auth
pub async fn graphql_playground() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
