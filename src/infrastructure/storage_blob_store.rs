//! Object storage URL resolution
//!
//! Looks up object metadata through the Firebase Storage REST endpoint and
//! turns it into a tokenized download URL.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::domain::errors::{StorefrontError, StorefrontResult};
use crate::domain::repositories::BlobStore;
use crate::infrastructure::http_client::HttpClient;
use crate::utils::encode_path_segment;

/// Subset of the object metadata resource we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    /// Comma-separated list; the first token is used
    download_tokens: Option<String>,
}

pub struct FirebaseStorageBlobStore {
    http: HttpClient,
    base_url: String,
    bucket: String,
}

impl FirebaseStorageBlobStore {
    pub fn new(http: HttpClient, base_url: &str, bucket: &str) -> StorefrontResult<Self> {
        let bucket = bucket.trim();
        if bucket.is_empty() {
            return Err(StorefrontError::initialization(
                "backend.storage_bucket is required for storage image source",
            ));
        }
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        })
    }

    pub fn metadata_url(&self, key: &str) -> String {
        format!(
            "{}/v0/b/{}/o/{}",
            self.base_url,
            encode_path_segment(&self.bucket),
            encode_path_segment(key)
        )
    }

    fn download_url(&self, key: &str, metadata: &ObjectMetadata) -> String {
        let mut url = format!("{}?alt=media", self.metadata_url(key));
        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').map(str::trim).find(|t| !t.is_empty()));
        if let Some(token) = token {
            url.push_str("&token=");
            url.push_str(&encode_path_segment(token));
        }
        url
    }
}

#[async_trait]
impl BlobStore for FirebaseStorageBlobStore {
    async fn resolve_url(&self, key: &str) -> StorefrontResult<String> {
        let response = self
            .http
            .get(&self.metadata_url(key))
            .await
            .map_err(|e| StorefrontError::object_lookup(key, format!("{e:#}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(StorefrontError::ObjectNotFound {
                    key: key.to_string(),
                    bucket: self.bucket.clone(),
                });
            }
            status if !status.is_success() => {
                return Err(StorefrontError::object_lookup(key, format!("HTTP {status}")));
            }
            _ => {}
        }

        let metadata: ObjectMetadata = response
            .json()
            .await
            .map_err(|e| StorefrontError::object_lookup(key, e.to_string()))?;

        let url = self.download_url(key, &metadata);
        debug!("Resolved {} -> {}", key, url);
        Ok(url)
    }
}
