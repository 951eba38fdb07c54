use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{checksum, BlobStore, StorageError, StoredObject};

/// Process-local blob store used with the memory backend and in tests
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, path: &str) -> Option<(String, Vec<u8>)> {
        self.objects.read().await.get(path).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<StoredObject, StorageError> {
        let object = StoredObject {
            path: path.to_string(),
            url: format!("memory://{}", path),
            size: bytes.len(),
            content_type: content_type.to_string(),
            checksum: checksum(&bytes),
        };
        self.objects
            .write()
            .await
            .insert(path.to_string(), (content_type.to_string(), bytes));
        Ok(object)
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(path);
        Ok(())
    }
}
