//! Domain service interfaces
//!
//! Network probes the image validation stage depends on.

use async_trait::async_trait;

use crate::domain::errors::StorefrontResult;

/// Metadata-only liveness probe for an image URL
#[async_trait]
pub trait ImageProbe: Send + Sync {
    /// Wait until a request may be issued. Callers await this before
    /// starting the per-check timeout and only then call [`Self::probe`].
    async fn ready(&self) {}

    /// Issue a request without transferring the body and return the HTTP
    /// status code. Transport failures are errors; any status is `Ok`.
    async fn probe(&self, url: &str) -> StorefrontResult<u16>;
}
