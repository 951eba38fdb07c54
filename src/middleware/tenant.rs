use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::models::DataEnvironment;
use crate::tenancy::TenantContext;

pub const ENVIRONMENT_HEADER: &str = "x-environment";

/// Builds the [`TenantContext`] from the authenticated user and the environment header.
/// Must run after [`super::jwt_auth_middleware`].
pub async fn tenant_context_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .copied()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    let environment = environment_from_headers(&headers)?;

    let ctx = TenantContext::new(user.tenant_id, user.user_id, environment);
    tracing::debug!(tenant_id = %ctx.tenant_id, environment = %ctx.environment, "Resolved tenant context");
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// `live` unless the header says otherwise; unknown values are rejected
pub fn environment_from_headers(headers: &HeaderMap) -> Result<DataEnvironment, ApiError> {
    let Some(value) = headers.get(ENVIRONMENT_HEADER) else {
        return Ok(DataEnvironment::Live);
    };
    let raw = value
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid x-environment header"))?
        .trim()
        .to_ascii_lowercase();
    match raw.as_str() {
        "" | "live" => Ok(DataEnvironment::Live),
        "test" => Ok(DataEnvironment::Test),
        other => Err(ApiError::bad_request(format!(
            "Invalid x-environment '{}': expected 'live' or 'test'",
            other
        ))),
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TenantContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .copied()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
