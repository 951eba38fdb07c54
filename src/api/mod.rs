//! Application state and the HTTP router.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

pub mod docs;

use crate::audit::{AuditSink, TracingAuditSink};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Repositories;
use crate::graphql::{build_schema, CatalogSchema};
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, tenant_context_middleware, ENVIRONMENT_HEADER};
use crate::notify::{LogNotifier, Msg91Notifier, Notifier};
use crate::services::Services;
use crate::storage::{BlobStore, FirebaseStorage, MemoryBlobStore};

/// Multipart framing allowance on top of the raw image size
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repos: Repositories,
    pub services: Services,
    pub schema: CatalogSchema,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        repos: Repositories,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let services = Services::new(&config, &repos, blobs, notifier, audit);
        let schema = build_schema(services.clone(), config.filter.clone());
        Self {
            config: Arc::new(config),
            repos,
            services,
            schema,
        }
    }

    /// Wires the configured store and integrations. Unconfigured integrations
    /// fall back to in-process stand-ins.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let repos = Repositories::from_config(&config)?;

        let blobs: Arc<dyn BlobStore> = match FirebaseStorage::from_config(&config.storage)? {
            Some(firebase) => Arc::new(firebase),
            None => {
                tracing::warn!("Firebase Storage not configured; uploaded images are kept in memory");
                Arc::new(MemoryBlobStore::new())
            }
        };
        let notifier: Arc<dyn Notifier> = match Msg91Notifier::from_config(&config.notifications)? {
            Some(msg91) => Arc::new(msg91),
            None => {
                tracing::warn!("MSG91 not configured; WhatsApp messages are only logged");
                Arc::new(LogNotifier)
            }
        };
        let audit = Arc::new(TracingAuditSink::new(config.security.enable_audit_logging));

        Ok(Self::new(config, repos, blobs, notifier, audit))
    }
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let upload_limit = config.storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let hard_limit = config.api.max_request_size_bytes.max(upload_limit);

    let protected_routes = Router::new()
        .merge(catalog_item_routes(upload_limit))
        .merge(resource_routes())
        .merge(notification_routes())
        .route_layer(middleware::from_fn(tenant_context_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware));

    // Only POST is authenticated; the explorer stays public
    let graphql = post(protected::graphql::graphql_handler)
        .route_layer(middleware::from_fn(tenant_context_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
        .get(protected::graphql::graphql_playground);

    let router = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api-docs/openapi.json", get(public::openapi))
        .route("/graphql", graphql)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(RequestBodyLimitLayer::new(hard_limit))
        .layer(TraceLayer::new_for_http());

    let router = match cors_layer(&config.security) {
        Some(cors) => router.layer(cors),
        None => router,
    };
    router.with_state(state)
}

fn catalog_item_routes(upload_limit: usize) -> Router<AppState> {
    use axum::routing::delete;
    use protected::catalog_items as items;

    Router::new()
        .route("/api/v1/catalog-items", get(items::list_catalog_items).post(items::create_catalog_item))
        .route(
            "/api/v1/catalog-items/:id",
            get(items::get_catalog_item)
                .put(items::update_catalog_item)
                .patch(items::update_catalog_item)
                .delete(items::delete_catalog_item),
        )
        .route("/api/v1/catalog-items/:id/restore", post(items::restore_catalog_item))
        .route("/api/v1/catalog-items/:id/versions", get(items::list_catalog_item_versions))
        .route(
            "/api/v1/catalog-items/:id/resources",
            get(items::list_catalog_item_resources).post(items::link_catalog_item_resource),
        )
        .route(
            "/api/v1/catalog-items/:id/resources/:resource_id",
            delete(items::unlink_catalog_item_resource),
        )
        .route(
            "/api/v1/catalog-items/:id/image",
            post(items::upload_catalog_item_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
}

fn resource_routes() -> Router<AppState> {
    use protected::resources;

    Router::new()
        .route("/api/v1/resources", get(resources::list_resources).post(resources::create_resource))
        .route(
            "/api/v1/resources/:id",
            get(resources::get_resource)
                .put(resources::update_resource)
                .patch(resources::update_resource)
                .delete(resources::delete_resource),
        )
        .route("/api/v1/resources/:id/restore", post(resources::restore_resource))
}

fn notification_routes() -> Router<AppState> {
    Router::new().route(
        "/api/v1/notifications/whatsapp",
        post(protected::notifications::send_whatsapp),
    )
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                header::AUTHORIZATION,
                header::CONTENT_TYPE,
                HeaderName::from_static(ENVIRONMENT_HEADER),
            ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingAuditSink;
    use crate::config::StoreBackend;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        let mut config = AppConfig::development();
        config.database.backend = StoreBackend::Memory;
        let state = AppState::new(
            config,
            Repositories::memory(),
            Arc::new(MemoryBlobStore::new()),
            Arc::new(LogNotifier),
            Arc::new(RecordingAuditSink::default()),
        );
        build_router(state)
    }

    #[tokio::test]
    async fn health_reports_backend() {
        let resp = router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["data"]["database"], "memory");
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let resp = router()
            .oneshot(Request::get("/api/v1/resources").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn preflight_allows_configured_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/catalog-items")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let resp = router().oneshot(request).await.unwrap();
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).and_then(|v| v.to_str().ok()),
            Some("http://localhost:5173")
        );
    }

    #[test]
    fn cors_can_be_disabled() {
        let mut security = AppConfig::development().security;
        security.enable_cors = false;
        assert!(cors_layer(&security).is_none());
    }
}
