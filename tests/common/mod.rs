#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::Router;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use service_catalog::api::{build_router, AppState};
use service_catalog::audit::RecordingAuditSink;
use service_catalog::auth::{generate_jwt, Claims};
use service_catalog::config::{AppConfig, StoreBackend};
use service_catalog::database::{DatabaseManager, Repositories};
use service_catalog::notify::{LogNotifier, Notifier};
use service_catalog::storage::{BlobStore, MemoryBlobStore};

/// An in-process server, one per test. Memory backend unless built with `spawn_postgres`.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub config: AppConfig,
    pub audit: RecordingAuditSink,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.backend = StoreBackend::Memory;
    config.database.run_migrations = false;
    config.security.enable_audit_logging = true;
    config
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(test_config(), Arc::new(MemoryBlobStore::new()), Arc::new(LogNotifier)).await
    }

    pub async fn spawn_with(
        config: AppConfig,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Self::spawn_on(config, Repositories::memory(), blobs, notifier).await
    }

    /// Server backed by the database in `DATABASE_URL`; `None` when it is unset
    pub async fn spawn_postgres() -> Result<Option<Self>> {
        let Some(repos) = postgres_repositories().await? else {
            return Ok(None);
        };
        let mut config = test_config();
        config.database.backend = StoreBackend::Postgres;
        let server = Self::spawn_on(config, repos, Arc::new(MemoryBlobStore::new()), Arc::new(LogNotifier)).await?;
        Ok(Some(server))
    }

    async fn spawn_on(
        config: AppConfig,
        repos: Repositories,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let audit = RecordingAuditSink::default();
        let state = AppState::new(config.clone(), repos, blobs, notifier, Arc::new(audit.clone()));
        let base_url = serve(build_router(state)).await?;
        let port = base_url
            .rsplit(':')
            .next()
            .and_then(|p| p.parse().ok())
            .context("base url has no port")?;

        let tenant_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let token = token_for(&config, tenant_id, user_id)?;

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
            tenant_id,
            user_id,
            token,
            config,
            audit,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Token for another tenant on the same server
    pub fn token_for_tenant(&self, tenant_id: Uuid) -> Result<String> {
        token_for(&self.config, tenant_id, Uuid::new_v4())
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(&self.token)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(&self.token)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(&self.token)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(&self.token)
    }

    /// POST a GraphQL document and return the whole response body
    pub async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let resp = self
            .post("/graphql")
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        anyhow::ensure!(resp.status() == StatusCode::OK, "graphql returned {}", resp.status());
        Ok(resp.json().await?)
    }

    /// Create a catalog item and return its `data` object
    pub async fn create_item(&self, body: Value) -> Result<Value> {
        let resp = self.post("/api/v1/catalog-items").json(&body).send().await?;
        anyhow::ensure!(resp.status() == StatusCode::CREATED, "create returned {}", resp.status());
        let payload: Value = resp.json().await?;
        Ok(payload["data"].clone())
    }

    pub async fn create_resource(&self, body: Value) -> Result<Value> {
        let resp = self.post("/api/v1/resources").json(&body).send().await?;
        anyhow::ensure!(resp.status() == StatusCode::CREATED, "create returned {}", resp.status());
        let payload: Value = resp.json().await?;
        Ok(payload["data"].clone())
    }
}

/// Migrated Postgres repositories for `DATABASE_URL`, or `None` to skip.
/// Tests stay isolated by using a fresh tenant id rather than a fresh database.
pub async fn postgres_repositories() -> Result<Option<Repositories>> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping postgres test");
        return Ok(None);
    };
    let mut config = test_config();
    config.database.backend = StoreBackend::Postgres;
    config.database.url = Some(url);
    config.database.max_connections = 4;

    let manager = DatabaseManager::connect(&config.database)?;
    manager.migrate().await?;
    Ok(Some(Repositories::postgres(manager, config.filter.max_limit)))
}

fn token_for(config: &AppConfig, tenant_id: Uuid, user_id: Uuid) -> Result<String> {
    let claims = Claims::new(tenant_id, user_id, 1);
    Ok(generate_jwt(&claims, &config.security.jwt_secret)?)
}

/// Bind a free local port and serve `router` on it in the background
pub async fn serve(router: Router) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://127.0.0.1:{}", port))
}

pub fn massage() -> Value {
    serde_json::json!({
        "name": "Deep Tissue Massage",
        "description": "60 minute full body session",
        "item_type": "service",
        "category": "wellness",
        "sku": "SPA-001",
        "pricing_type": "per_session",
        "unit_price": "49.99",
        "duration_minutes": 60,
        "status": "active"
    })
}

pub fn therapist() -> Value {
    serde_json::json!({
        "name": "Asha Rao",
        "resource_type": "staff",
        "contact_email": "asha@example.com",
        "contact_phone": "+919876543210",
        "hourly_cost": "20.00"
    })
}
