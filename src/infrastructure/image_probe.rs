use async_trait::async_trait;

use crate::domain::errors::{StorefrontError, StorefrontResult};
use crate::domain::services::ImageProbe;
use crate::infrastructure::http_client::HttpClient;

/// HEAD-request liveness probe
#[derive(Clone)]
pub struct HttpImageProbe {
    http: HttpClient,
}

impl HttpImageProbe {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageProbe for HttpImageProbe {
    async fn ready(&self) {
        self.http.ready().await;
    }

    async fn probe(&self, url: &str) -> StorefrontResult<u16> {
        self.http
            .head(url)
            .await
            .map(|status| status.as_u16())
            .map_err(|e| StorefrontError::image_probe(url, format!("{e:#}")))
    }
}
