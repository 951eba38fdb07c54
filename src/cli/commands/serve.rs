use anyhow::Context;

use crate::api::{build_router, AppState};
use crate::config::{AppConfig, StoreBackend};
use crate::is_production;

pub async fn handle(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    if is_production!() {
        anyhow::ensure!(
            config.database.backend == StoreBackend::Postgres,
            "the memory store backend is not allowed in production"
        );
        anyhow::ensure!(!config.security.jwt_secret.is_empty(), "JWT_SECRET must be set in production");
    }

    let state = AppState::from_config(config.clone())?;
    if let Some(manager) = &state.repos.manager {
        if config.database.run_migrations {
            manager.migrate().await.context("failed to apply migrations")?;
            tracing::info!("Database migrations applied");
        }
    }

    let app = build_router(state.clone());
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        backend = state.repos.backend_name(),
        firebase = config.storage.firebase_enabled(),
        msg91 = config.notifications.msg91_enabled(),
        "Service Catalog API listening on http://{}",
        bind_addr
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(manager) = &state.repos.manager {
        manager.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
