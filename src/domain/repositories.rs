//! Repository interfaces for the storefront catalog
//!
//! Both backends are read-only from the storefront's point of view.

use async_trait::async_trait;

use crate::domain::constants::catalog;
use crate::domain::errors::StorefrontResult;
use crate::domain::product::ProductDocument;

/// "Most recent N" query against a catalog collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentQuery {
    pub collection: String,
    /// Field ordered descending
    pub order_field: String,
    pub limit: u32,
}

impl Default for RecentQuery {
    fn default() -> Self {
        Self {
            collection: catalog::COLLECTION.to_string(),
            order_field: catalog::ORDER_FIELD.to_string(),
            limit: catalog::MAX_PAGE_SIZE,
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch up to `query.limit` documents, newest first.
    async fn fetch_recent(&self, query: &RecentQuery) -> StorefrontResult<Vec<ProductDocument>>;
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Resolve an object key (e.g. `products/{id}.jpg`) to a retrievable URL.
    async fn resolve_url(&self, key: &str) -> StorefrontResult<String>;
}
