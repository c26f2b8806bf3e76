//! Image source validation
//!
//! Two gates per record: a synchronous host allow-list and an asynchronous
//! HEAD liveness probe. Probes for one result set run concurrently under a
//! semaphore, each with its own timeout, and the caller gets the survivors
//! back in their original order once every probe has settled.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::product::ProductDocument;
use crate::domain::services::ImageProbe;
use crate::infrastructure::config::ImageConfig;

/// Per-cycle validation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub candidates: usize,
    pub missing_image: usize,
    pub rejected_host: usize,
    pub failed_probe: usize,
    pub accepted: usize,
}

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Documents that passed both gates, in input order
    pub accepted: Vec<ProductDocument>,
    pub summary: ValidationSummary,
}

#[derive(Clone)]
pub struct ImageValidator {
    probe: Arc<dyn ImageProbe>,
    allowed_hosts: Vec<String>,
    max_concurrent: usize,
    timeout: Duration,
}

impl ImageValidator {
    pub fn new(probe: Arc<dyn ImageProbe>, config: &ImageConfig) -> Self {
        Self {
            probe,
            allowed_hosts: config
                .allowed_hosts
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            max_concurrent: config.max_concurrent_checks.max(1),
            timeout: config.check_timeout(),
        }
    }

    /// Allow-list gate. Only http(s) URLs whose host contains an approved
    /// host substring pass; this never touches the network.
    pub fn is_allowed_source(&self, reference: &str) -> bool {
        let Ok(url) = Url::parse(reference) else {
            return false;
        };
        if !matches!(url.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.allowed_hosts.iter().any(|allowed| host.contains(allowed.as_str()))
    }

    /// Liveness gate for a single URL. Any failure is `false`.
    pub async fn is_live(&self, url: &str) -> bool {
        check_liveness(self.probe.as_ref(), url, self.timeout).await
    }

    /// Run both gates over a result set.
    ///
    /// Cancelling `cancel` abandons probes that haven't settled; they count
    /// as failed.
    pub async fn filter_valid(
        &self,
        documents: Vec<ProductDocument>,
        cancel: &CancellationToken,
    ) -> ValidationOutcome {
        let mut summary = ValidationSummary {
            candidates: documents.len(),
            ..Default::default()
        };

        let mut pending = Vec::new();
        for (slot, document) in documents.iter().enumerate() {
            match document.record.image_reference() {
                None => {
                    summary.missing_image += 1;
                    debug!("No image reference for {}", document.id);
                }
                Some(reference) if !self.is_allowed_source(reference) => {
                    summary.rejected_host += 1;
                    warn!("🚫 Image host not allowed for {}: {}", document.id, reference);
                }
                Some(reference) => pending.push((slot, reference.to_string())),
            }
        }

        info!(
            "🖼️ Probing {} images (max concurrent: {}, timeout: {:?})",
            pending.len(),
            self.max_concurrent,
            self.timeout
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = Vec::with_capacity(pending.len());
        for (slot, url) in pending {
            let probe = Arc::clone(&self.probe);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let timeout = self.timeout;

            tasks.push(tokio::spawn(async move {
                let checked = async {
                    let Ok(_permit) = semaphore.acquire().await else {
                        return false;
                    };
                    check_liveness(probe.as_ref(), &url, timeout).await
                };
                let live = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Probe abandoned for {}", url);
                        false
                    }
                    live = checked => live,
                };
                (slot, live)
            }));
        }

        let mut passed = vec![false; documents.len()];
        for result in join_all(tasks).await {
            match result {
                Ok((slot, live)) => passed[slot] = live,
                Err(e) => warn!("Image probe task failed: {}", e),
            }
        }

        let accepted: Vec<ProductDocument> = documents
            .into_iter()
            .zip(passed)
            .filter_map(|(document, ok)| ok.then_some(document))
            .collect();

        summary.accepted = accepted.len();
        summary.failed_probe =
            summary.candidates - summary.missing_image - summary.rejected_host - summary.accepted;

        info!(
            "✅ Image validation: {}/{} accepted \
             ({} without image, {} disallowed host, {} failed probe)",
            summary.accepted,
            summary.candidates,
            summary.missing_image,
            summary.rejected_host,
            summary.failed_probe
        );

        ValidationOutcome { accepted, summary }
    }
}

/// The timeout covers the request only, not the wait for a rate limiter slot.
async fn check_liveness(probe: &dyn ImageProbe, url: &str, timeout: Duration) -> bool {
    probe.ready().await;
    match tokio::time::timeout(timeout, probe.probe(url)).await {
        Ok(Ok(status)) if (200..300).contains(&status) => {
            debug!("Image live: {} ({})", url, status);
            true
        }
        Ok(Ok(status)) => {
            warn!("⚠️ Image check returned HTTP {}: {}", status, url);
            false
        }
        Ok(Err(e)) => {
            warn!("⚠️ {}", e);
            false
        }
        Err(_) => {
            warn!("⏰ Image check timed out after {:?}: {}", timeout, url);
            false
        }
    }
}
