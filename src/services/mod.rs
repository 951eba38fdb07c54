//! Business operations shared by the REST handlers and the GraphQL resolvers.
//!
//! Every operation takes the caller's [`crate::tenancy::TenantContext`] and
//! records an audit event for each mutation it performs.

pub mod catalog_service;
pub mod notification_service;
pub mod resource_service;

use std::sync::Arc;

pub use catalog_service::{CatalogService, ImageUpload};
pub use notification_service::NotificationService;
pub use resource_service::ResourceService;

use crate::audit::AuditSink;
use crate::config::AppConfig;
use crate::database::Repositories;
use crate::notify::Notifier;
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct Services {
    pub catalog: CatalogService,
    pub resources: ResourceService,
    pub notifications: NotificationService,
}

impl Services {
    pub fn new(
        config: &AppConfig,
        repos: &Repositories,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            catalog: CatalogService::new(repos.catalog.clone(), blobs, audit.clone(), config.storage.clone()),
            resources: ResourceService::new(repos.resources.clone(), audit.clone()),
            notifications: NotificationService::new(notifier, audit, config.notifications.default_language.clone()),
        }
    }
}
