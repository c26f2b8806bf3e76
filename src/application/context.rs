//! Startup wiring
//!
//! Backend clients are built exactly once here and handed to the
//! orchestrator. A failure at this point is an initialization failure: the
//! page shows a static error and offers no retry.

use std::sync::Arc;
use tracing::info;

use crate::application::card_builder::CardBuilder;
use crate::application::display::DisplayContainer;
use crate::application::image_validator::ImageValidator;
use crate::application::orchestrator::{ImageStrategy, StorefrontOrchestrator};
use crate::domain::errors::{StorefrontError, StorefrontResult};
use crate::domain::repositories::{DocumentStore, RecentQuery};
use crate::infrastructure::config::{AppConfig, ImageSource};
use crate::infrastructure::firestore_store::FirestoreDocumentStore;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::image_probe::HttpImageProbe;
use crate::infrastructure::storage_blob_store::FirebaseStorageBlobStore;

pub struct StorefrontContext {
    pub store: Arc<dyn DocumentStore>,
    pub images: ImageStrategy,
    pub cards: CardBuilder,
    pub query: RecentQuery,
}

impl StorefrontContext {
    pub fn initialize(config: &AppConfig) -> StorefrontResult<Self> {
        let http = HttpClient::new(config.http.clone())
            .map_err(|e| StorefrontError::initialization(format!("{e:#}")))?;

        let store = FirestoreDocumentStore::new(http.clone(), &config.backend)?;
        info!("Document store endpoint: {}", store.endpoint().path());

        let images = match config.images.source {
            ImageSource::Validated => {
                let probe = Arc::new(HttpImageProbe::new(http));
                ImageStrategy::Validated(ImageValidator::new(probe, &config.images))
            }
            ImageSource::Storage => {
                let bucket = config.backend.storage_bucket.as_deref().unwrap_or_default();
                let blobs =
                    FirebaseStorageBlobStore::new(http, &config.backend.storage_base_url, bucket)?;
                ImageStrategy::Storage(Arc::new(blobs))
            }
        };

        Ok(Self {
            store: Arc::new(store),
            images,
            cards: CardBuilder::new(&config.retailer),
            query: config.catalog.recent_query(),
        })
    }

    pub fn into_orchestrator(self, container: Arc<dyn DisplayContainer>) -> StorefrontOrchestrator {
        StorefrontOrchestrator::new(self.store, self.images, self.cards, self.query, container)
    }
}
