pub mod manager;
pub mod memory;
pub mod postgres;
pub mod query_builder;
pub mod repository;

use std::sync::Arc;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use repository::{CatalogRepository, ResourceRepository};

use crate::config::{AppConfig, StoreBackend};
use postgres::{PgCatalogRepository, PgResourceRepository};

/// The repositories the services run against, plus the pool behind them if any
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogRepository>,
    pub resources: Arc<dyn ResourceRepository>,
    pub manager: Option<DatabaseManager>,
}

impl Repositories {
    pub fn from_config(config: &AppConfig) -> Result<Self, DatabaseError> {
        match config.database.backend {
            StoreBackend::Memory => Ok(Self::memory()),
            StoreBackend::Postgres => {
                let manager = DatabaseManager::connect(&config.database)?;
                Ok(Self::postgres(manager, config.filter.max_limit))
            }
        }
    }

    pub fn memory() -> Self {
        let store = MemoryStore::new();
        Self {
            catalog: Arc::new(store.clone()),
            resources: Arc::new(store),
            manager: None,
        }
    }

    pub fn postgres(manager: DatabaseManager, max_limit: u32) -> Self {
        let pool = manager.pool().clone();
        Self {
            catalog: Arc::new(PgCatalogRepository::new(pool.clone(), max_limit)),
            resources: Arc::new(PgResourceRepository::new(pool, max_limit)),
            manager: Some(manager),
        }
    }

    /// `Ok` for the memory backend; a round trip to Postgres otherwise
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match &self.manager {
            Some(manager) => manager.health_check().await,
            None => Ok(()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        if self.manager.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }
}
