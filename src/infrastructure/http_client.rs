//! HTTP client for backend queries and image probes
//!
//! Thin wrapper over `reqwest` with a shared token-bucket rate limiter so a
//! full page of concurrent image probes can't hammer the CDN.

use anyhow::{Context, Result};
use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, USER_AGENT},
    Client, Response, StatusCode,
};
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub use crate::infrastructure::config::HttpClientConfig;

/// Rate-limited HTTP client. Clones share the connection pool and the limiter.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .gzip(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Wait for a rate limiter slot
    pub async fn ready(&self) {
        self.rate_limiter.until_ready().await;
    }

    /// Metadata-only request; returns the final status without reading a body.
    /// Does not wait on the limiter: take a slot with [`Self::ready`] first.
    pub async fn head(&self, url: &str) -> Result<StatusCode> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .with_context(|| format!("HEAD request failed: {url}"))?;

        debug!("HEAD {} -> {}", url, response.status());
        Ok(response.status())
    }

    /// GET without status checking; callers decide what a failure status means
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        debug!("GET {} -> {}", url, response.status());
        Ok(response)
    }

    /// POST a JSON body without status checking
    pub async fn post_json<T>(&self, url: &str, body: &T) -> Result<Response>
    where
        T: Serialize + ?Sized,
    {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST request failed: {url}"))?;

        debug!("POST {} -> {}", url, response.status());
        Ok(response)
    }
}
