//! Load orchestrator
//!
//! Drives one fetch → validate → render cycle at a time and owns the
//! display container. Every cycle gets a new generation number; a cycle
//! that finishes after a newer one has started is dropped and its pending
//! image probes are cancelled.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::card_builder::{CardBuilder, ProductCard};
use crate::application::display::{DisplayContainer, PageView, FETCH_FAILED_MESSAGE};
use crate::application::image_validator::ImageValidator;
use crate::application::state::{LoadOutcome, LoadState};
use crate::domain::product::{ProductDocument, ProductId};
use crate::domain::repositories::{BlobStore, DocumentStore, RecentQuery};

/// How card images are obtained
#[derive(Clone)]
pub enum ImageStrategy {
    /// Record image URLs, allow-listed and probed concurrently; failures drop the record
    Validated(ImageValidator),
    /// Object storage lookups, one record at a time; failures use the placeholder
    Storage(Arc<dyn BlobStore>),
}

/// User interaction delivered from the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Retry,
    Buy { product_id: ProductId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    NewBrowsingContext { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResponse {
    Reloaded(LoadOutcome),
    Navigate(Navigation),
    Ignored,
}

struct CycleState {
    state: LoadState,
    generation: u64,
    cancel: CancellationToken,
    cards: Vec<ProductCard>,
}

pub struct StorefrontOrchestrator {
    store: Arc<dyn DocumentStore>,
    images: ImageStrategy,
    cards: CardBuilder,
    query: RecentQuery,
    container: Arc<dyn DisplayContainer>,
    cycle: Mutex<CycleState>,
}

impl StorefrontOrchestrator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        images: ImageStrategy,
        cards: CardBuilder,
        query: RecentQuery,
        container: Arc<dyn DisplayContainer>,
    ) -> Self {
        Self {
            store,
            images,
            cards,
            query,
            container,
            cycle: Mutex::new(CycleState {
                state: LoadState::Idle,
                generation: 0,
                cancel: CancellationToken::new(),
                cards: Vec::new(),
            }),
        }
    }

    pub fn state(&self) -> LoadState {
        self.lock().state
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Cards currently on display (empty unless rendered)
    pub fn cards(&self) -> Vec<ProductCard> {
        self.lock().cards.clone()
    }

    /// Start signal. Only the first call from `Idle` loads anything.
    pub async fn start(&self) -> Option<LoadOutcome> {
        if self.state() != LoadState::Idle {
            debug!("Start signal ignored in state {}", self.state());
            return None;
        }
        Some(self.load().await)
    }

    /// Re-run the full pipeline from `Empty` or `Error`
    pub async fn retry(&self) -> Option<LoadOutcome> {
        let state = self.state();
        if !state.can_retry() {
            debug!("Retry ignored in state {}", state);
            return None;
        }
        info!("🔄 Retrying load from {} state", state);
        Some(self.load().await)
    }

    pub async fn handle(&self, event: UiEvent) -> EventResponse {
        match event {
            UiEvent::Retry => match self.retry().await {
                Some(outcome) => EventResponse::Reloaded(outcome),
                None => EventResponse::Ignored,
            },
            UiEvent::Buy { product_id } => {
                let url = self
                    .lock()
                    .cards
                    .iter()
                    .find(|card| card.product_id == product_id)
                    .map(|card| card.purchase_url.clone());
                match url {
                    Some(url) => {
                        info!("🛒 Buy {} -> {}", product_id, url);
                        EventResponse::Navigate(Navigation::NewBrowsingContext { url })
                    }
                    None => {
                        warn!("Buy event for product not on display: {}", product_id);
                        EventResponse::Ignored
                    }
                }
            }
        }
    }

    /// One complete load cycle, superseding any cycle still in flight
    pub async fn load(&self) -> LoadOutcome {
        let (generation, cancel) = self.begin_cycle();
        info!("📦 Load cycle {} started", generation);

        let documents = match self.store.fetch_recent(&self.query).await {
            Ok(documents) => documents,
            Err(e) => {
                error!("❌ Failed to fetch products: {}", e);
                return self.finish(
                    generation,
                    LoadOutcome::Failed {
                        generation,
                        reason: e.to_string(),
                    },
                );
            }
        };
        info!("Fetched {} product records", documents.len());

        let cards = match &self.images {
            ImageStrategy::Validated(validator) => {
                let outcome = validator.filter_valid(documents, &cancel).await;
                outcome
                    .accepted
                    .iter()
                    .map(|doc| {
                        let image = doc.record.image_reference().map(str::to_string);
                        self.cards.build(doc, image)
                    })
                    .collect()
            }
            ImageStrategy::Storage(blobs) => {
                self.cards_from_storage(blobs.as_ref(), &documents, &cancel)
                    .await
            }
        };

        let outcome = if cards.is_empty() {
            LoadOutcome::Empty { generation }
        } else {
            LoadOutcome::Rendered { generation, cards }
        };
        self.finish(generation, outcome)
    }

    async fn cards_from_storage(
        &self,
        blobs: &dyn BlobStore,
        documents: &[ProductDocument],
        cancel: &CancellationToken,
    ) -> Vec<ProductCard> {
        let mut cards = Vec::with_capacity(documents.len());
        for doc in documents {
            if cancel.is_cancelled() {
                debug!("Storage resolution abandoned at {}", doc.id);
                break;
            }
            let key = doc.id.storage_key();
            let image = match blobs.resolve_url(&key).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!("⚠️ Using placeholder image for {}: {}", doc.id, e);
                    None
                }
            };
            cards.push(self.cards.build(doc, image));
        }
        cards
    }

    fn begin_cycle(&self) -> (u64, CancellationToken) {
        let mut cycle = self.lock();
        cycle.cancel.cancel();
        cycle.generation += 1;
        cycle.cancel = CancellationToken::new();
        cycle.state = LoadState::Loading;
        cycle.cards.clear();
        self.show(&PageView::Loading);
        (cycle.generation, cycle.cancel.clone())
    }

    fn finish(&self, generation: u64, outcome: LoadOutcome) -> LoadOutcome {
        let mut cycle = self.lock();
        if cycle.generation != generation {
            info!(
                "⏭️ Discarding result of cycle {} (current is {})",
                generation, cycle.generation
            );
            return LoadOutcome::Superseded { generation };
        }

        let view = match &outcome {
            LoadOutcome::Rendered { cards, .. } => {
                cycle.cards = cards.clone();
                PageView::Products(cards.clone())
            }
            LoadOutcome::Empty { .. } => PageView::Empty,
            LoadOutcome::Failed { .. } => PageView::Failed {
                message: FETCH_FAILED_MESSAGE.to_string(),
            },
            LoadOutcome::Superseded { .. } => return LoadOutcome::Superseded { generation },
        };
        if let Some(state) = outcome.state() {
            cycle.state = state;
        }
        self.show(&view);
        info!(
            "🏁 Load cycle {} finished: {} ({} cards)",
            generation,
            cycle.state,
            view.card_count()
        );
        outcome
    }

    fn show(&self, view: &PageView) {
        if let Err(e) = self.container.replace(view) {
            error!("❌ {}", e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, CycleState> {
        self.cycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
