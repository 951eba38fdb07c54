//! GraphQL surface over the same services the REST handlers use.
//!
//! Enum values are exposed in `SCREAMING_SNAKE_CASE` and field names in
//! camelCase; both are translated back to the internal snake_case forms
//! before anything reaches a service.

use async_graphql::{Context, EmptySubscription, ErrorExtensions, Schema};

pub mod mutation;
pub mod query;
pub mod types;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

use crate::config::FilterConfig;
use crate::error::ApiError;
use crate::services::Services;
use crate::tenancy::TenantContext;

pub type CatalogSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(services: Services, filter: FilterConfig) -> CatalogSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(services)
        .data(filter)
        .finish()
}

/// Keeps the `code` extension when an [`ApiError`] crosses into GraphQL
pub(crate) trait GraphqlResultExt<T> {
    fn extended(self) -> async_graphql::Result<T>;
}

impl<T, E: Into<ApiError>> GraphqlResultExt<T> for Result<T, E> {
    fn extended(self) -> async_graphql::Result<T> {
        self.map_err(|e| e.into().extend())
    }
}

/// Tenant context attached by the HTTP handler
pub(crate) fn tenant<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a TenantContext> {
    ctx.data::<TenantContext>()
        .map_err(|_| ApiError::unauthorized("Authentication required").extend())
}

pub(crate) fn services<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Services> {
    ctx.data::<Services>()
}
