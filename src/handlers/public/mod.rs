use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use utoipa::OpenApi;

use crate::api::docs::ApiDoc;
use crate::api::AppState;

/// GET / - service info
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Service Catalog API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant catalog of services, products and the resources that deliver them",
            "endpoints": {
                "health": "/health (public)",
                "docs": "/api-docs/openapi.json (public)",
                "catalog_items": "/api/v1/catalog-items[/:id] (protected)",
                "resources": "/api/v1/resources[/:id] (protected)",
                "notifications": "/api/v1/notifications/whatsapp (protected)",
                "graphql": "/graphql (POST protected, GET playground)",
            }
        }
    }))
}

/// GET /health - 503 when the store is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let backend = state.repos.backend_name();

    match state.repos.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": backend,
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": backend,
                    }
                })),
            )
        }
    }
}

/// GET /api-docs/openapi.json
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
