//! Firestore-backed product catalog
//!
//! Read-only access through the REST `documents:runQuery` endpoint. Only a
//! single structured query is ever issued: newest N documents of one
//! collection.

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::errors::{StorefrontError, StorefrontResult};
use crate::domain::product::{ProductDocument, ProductId, ProductRecord};
use crate::domain::repositories::{DocumentStore, RecentQuery};
use crate::infrastructure::config::BackendConfig;
use crate::infrastructure::firestore_value::{fields_into_json, RunQueryRow};
use crate::infrastructure::http_client::HttpClient;

/// Longest error body echoed into an error message
const MAX_ERROR_BODY: usize = 300;

pub struct FirestoreDocumentStore {
    http: HttpClient,
    endpoint: Url,
}

impl FirestoreDocumentStore {
    pub fn new(http: HttpClient, backend: &BackendConfig) -> StorefrontResult<Self> {
        let project_id = backend.project_id.trim();
        if project_id.is_empty() {
            return Err(StorefrontError::initialization(
                "backend.project_id is not configured",
            ));
        }

        let raw = format!(
            "{}/v1/projects/{}/databases/{}/documents:runQuery",
            backend.firestore_base_url.trim_end_matches('/'),
            project_id,
            backend.database,
        );
        let mut endpoint = Url::parse(&raw).map_err(|e| {
            StorefrontError::initialization(format!("Invalid document store URL '{raw}': {e}"))
        })?;
        if let Some(key) = backend.api_key.as_deref().filter(|k| !k.is_empty()) {
            endpoint.query_pairs_mut().append_pair("key", key);
        }

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Structured query body: one collection, ordered descending, limited
    pub fn build_query(query: &RecentQuery) -> serde_json::Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": query.collection }],
                "orderBy": [{
                    "field": { "fieldPath": query.order_field },
                    "direction": "DESCENDING"
                }],
                "limit": query.limit
            }
        })
    }

    /// Decode a `runQuery` response body into product documents.
    ///
    /// Rows without a document (the bare `readTime` row of an empty result)
    /// are skipped. A row that doesn't decode is logged and skipped; only a
    /// body that isn't a JSON array fails the whole page.
    pub fn parse_run_query_response(body: &str) -> StorefrontResult<Vec<ProductDocument>> {
        let rows: Vec<serde_json::Value> = serde_json::from_str(body)
            .map_err(|e| StorefrontError::decode("runQuery response", e.to_string()))?;

        let mut documents = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let document = match serde_json::from_value::<RunQueryRow>(row) {
                Ok(RunQueryRow { document: Some(document), .. }) => document,
                Ok(_) => continue,
                Err(e) => {
                    warn!("⚠️ Skipping undecodable runQuery row {}: {}", index, e);
                    continue;
                }
            };
            let id = document.document_id().to_string();
            let fields = serde_json::Value::Object(fields_into_json(document.fields));
            match serde_json::from_value::<ProductRecord>(fields) {
                Ok(record) => documents.push(ProductDocument::new(ProductId::new(id), record)),
                Err(e) => warn!("⚠️ Skipping product document {}: {}", id, e),
            }
        }
        Ok(documents)
    }

    fn error_message(body: &str) -> String {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(|v| {
                // runQuery errors come back either bare or wrapped in an array
                v.pointer("/error/message")
                    .or_else(|| v.pointer("/0/error/message"))
            })
            .and_then(|m| m.as_str());

        match message {
            Some(m) => m.to_string(),
            None => body.chars().take(MAX_ERROR_BODY).collect(),
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn fetch_recent(&self, query: &RecentQuery) -> StorefrontResult<Vec<ProductDocument>> {
        info!(
            "🔎 Querying '{}' for the {} most recent records",
            query.collection, query.limit
        );

        let body = Self::build_query(query);
        let response = self
            .http
            .post_json(self.endpoint.as_str(), &body)
            .await
            .map_err(|e| StorefrontError::store_query(&query.collection, format!("{e:#}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StorefrontError::store_query(&query.collection, e.to_string()))?;

        if !status.is_success() {
            return Err(StorefrontError::StoreStatus {
                status: status.as_u16(),
                message: Self::error_message(&text),
            });
        }

        let documents = Self::parse_run_query_response(&text)?;
        debug!("runQuery returned {} product documents", documents.len());
        Ok(documents)
    }
}
