//! Firebase Storage via its REST API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{checksum, BlobStore, StorageError, StoredObject};
use crate::config::StorageConfig;

pub struct FirebaseStorage {
    client: Client,
    base_url: String,
    bucket: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    name: String,
    download_tokens: Option<String>,
}

impl FirebaseStorage {
    pub fn new(base_url: &str, bucket: &str, access_token: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create Firebase Storage HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            access_token: access_token.to_string(),
        })
    }

    pub fn from_config(config: &StorageConfig) -> anyhow::Result<Option<Self>> {
        match (&config.firebase_bucket, &config.firebase_access_token) {
            (Some(bucket), Some(token)) => Ok(Some(Self::new(&config.firebase_base_url, bucket, token)?)),
            _ => Ok(None),
        }
    }

    fn objects_url(&self) -> String {
        format!("{}/v0/b/{}/o", self.base_url, self.bucket)
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/{}", self.objects_url(), encode_path(path))
    }

    /// Public download URL for an uploaded object
    pub(crate) fn download_url(&self, path: &str, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("{}?alt=media&token={}", self.object_url(path), token),
            None => format!("{}?alt=media", self.object_url(path)),
        }
    }
}

/// Object names go into a single path segment, so `/` must be escaped too
fn encode_path(path: &str) -> String {
    url::form_urlencoded::byte_serialize(path.as_bytes()).collect()
}

#[async_trait]
impl BlobStore for FirebaseStorage {
    async fn put(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> Result<StoredObject, StorageError> {
        let size = bytes.len();
        let digest = checksum(&bytes);

        let response = self
            .client
            .post(self.objects_url())
            .query(&[("uploadType", "media"), ("name", path)])
            .bearer_auth(&self.access_token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), path, "Firebase Storage rejected upload");
            return Err(StorageError::Rejected { status: status.as_u16(), body });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
        // Several comma-separated tokens may exist; any of them works
        let token = uploaded
            .download_tokens
            .as_deref()
            .and_then(|t| t.split(',').next())
            .map(str::to_string);

        tracing::debug!(path = %uploaded.name, size, "Uploaded object to Firebase Storage");
        Ok(StoredObject {
            url: self.download_url(&uploaded.name, token.as_deref()),
            path: uploaded.name,
            size,
            content_type: content_type.to_string(),
            checksum: digest,
        })
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let response = self
            .client
            .delete(self.object_url(path))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::Rejected { status: status.as_u16(), body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_escape_object_path() {
        let storage = FirebaseStorage::new("https://firebasestorage.googleapis.com/", "demo.appspot.com", "t").unwrap();
        assert_eq!(
            storage.objects_url(),
            "https://firebasestorage.googleapis.com/v0/b/demo.appspot.com/o"
        );
        assert_eq!(
            storage.download_url("tenants/a/live/x.png", Some("tok")),
            "https://firebasestorage.googleapis.com/v0/b/demo.appspot.com/o/tenants%2Fa%2Flive%2Fx.png?alt=media&token=tok"
        );
    }

    #[test]
    fn disabled_without_bucket_and_token() {
        let config = crate::config::AppConfig::development().storage;
        assert!(FirebaseStorage::from_config(&config).unwrap().is_none());
    }
}
