//! Blob storage for catalog item images.

use async_trait::async_trait;
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::tenancy::TenantScope;

pub mod firebase;
pub mod memory;

pub use firebase::FirebaseStorage;
pub use memory::MemoryBlobStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage provider rejected the upload ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("storage provider returned an unexpected response: {0}")]
    InvalidResponse(String),

    #[error("storage provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StoredObject {
    pub path: String,
    pub url: String,
    pub size: usize,
    pub content_type: String,
    /// Hex SHA-256 of the stored bytes
    pub checksum: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<StoredObject, StorageError>;

    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

/// `tenants/{tenant}/{env}/catalog-items/{original_id}/{uuid}.{ext}`
pub fn catalog_image_path(scope: &TenantScope, original_id: Uuid, extension: &str) -> String {
    format!(
        "tenants/{}/{}/catalog-items/{}/{}.{}",
        scope.tenant_id,
        scope.environment(),
        original_id,
        Uuid::new_v4(),
        extension
    )
}

pub fn checksum(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
