//! End-to-end load cycle tests with in-process backends

use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use affiliate_storefront_lib::application::display::{
    DisplayContainer, PageView, EMPTY_MESSAGE, FETCH_FAILED_MESSAGE,
};
use affiliate_storefront_lib::application::{
    CardBuilder, EventResponse, ImageStrategy, ImageValidator, LoadOutcome, LoadState, Navigation,
    StorefrontOrchestrator, UiEvent,
};
use affiliate_storefront_lib::domain::{
    BlobStore, DocumentStore, ImageProbe, ProductDocument, ProductId, ProductRecord, RecentQuery,
    StorefrontError, StorefrontResult,
};
use affiliate_storefront_lib::drive;
use affiliate_storefront_lib::infrastructure::config::{ImageConfig, PageConfig, RetailerConfig};
use affiliate_storefront_lib::infrastructure::PageRenderer;

/// Keeps every view the orchestrator shows, in order
#[derive(Default)]
struct RecordingContainer {
    views: Mutex<Vec<PageView>>,
}

impl RecordingContainer {
    fn new() -> Self {
        Self::default()
    }

    fn views(&self) -> Vec<PageView> {
        self.views.lock().unwrap().clone()
    }

    fn last(&self) -> Option<PageView> {
        self.views.lock().unwrap().last().cloned()
    }
}

impl DisplayContainer for RecordingContainer {
    fn replace(&self, view: &PageView) -> StorefrontResult<()> {
        self.views.lock().unwrap().push(view.clone());
        Ok(())
    }
}

/// Serves queued responses in order; the last one repeats
struct ScriptedStore {
    responses: Mutex<VecDeque<StorefrontResult<Vec<ProductDocument>>>>,
    calls: AtomicUsize,
}

impl ScriptedStore {
    fn new(responses: Vec<StorefrontResult<Vec<ProductDocument>>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl DocumentStore for ScriptedStore {
    async fn fetch_recent(&self, query: &RecentQuery) -> StorefrontResult<Vec<ProductDocument>> {
        assert_eq!(query.limit, 100);
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap()
        }
    }
}

/// Fixed status per URL, counting calls
struct SpyProbe {
    statuses: HashMap<String, u16>,
    calls: AtomicUsize,
}

impl SpyProbe {
    fn new(entries: &[(&str, u16)]) -> Arc<Self> {
        Arc::new(Self {
            statuses: entries.iter().map(|(u, s)| ((*u).to_string(), *s)).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ImageProbe for SpyProbe {
    async fn probe(&self, url: &str) -> StorefrontResult<u16> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .get(url)
            .copied()
            .ok_or_else(|| StorefrontError::image_probe(url, "connection refused"))
    }
}

struct FakeBlobStore {
    objects: HashMap<String, String>,
    lookups: Mutex<Vec<String>>,
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn resolve_url(&self, key: &str) -> StorefrontResult<String> {
        self.lookups.lock().unwrap().push(key.to_string());
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorefrontError::ObjectNotFound {
                key: key.to_string(),
                bucket: "shop.appspot.com".to_string(),
            })
    }
}

fn product(id: &str, fields: serde_json::Value) -> ProductDocument {
    let record: ProductRecord = serde_json::from_value(fields).unwrap();
    ProductDocument::new(ProductId::new(id), record)
}

fn validated(
    store: Arc<ScriptedStore>,
    probe: Arc<SpyProbe>,
    container: Arc<RecordingContainer>,
) -> StorefrontOrchestrator {
    let validator = ImageValidator::new(probe, &ImageConfig::default());
    StorefrontOrchestrator::new(
        store,
        ImageStrategy::Validated(validator),
        CardBuilder::new(&RetailerConfig::default()),
        RecentQuery::default(),
        container,
    )
}

const LIVE: &str = "https://m.media-amazon.com/images/I/live.jpg";
const DEAD: &str = "https://images-na.ssl-images-amazon.com/images/I/dead.jpg";
const STORAGE: &str = "https://firebasestorage.googleapis.com";

#[tokio::test]
async fn only_allowed_and_live_images_are_rendered() {
    let store = ScriptedStore::new(vec![Ok(vec![
        product("A", json!({ "title": "Bad Host", "image": "https://cdn.example.com/a.jpg" })),
        product("B", json!({ "title": "Dead Image", "image": DEAD })),
        product("C", json!({
            "title": "Wireless Mouse $19.99",
            "price": "$19.99",
            "rating": 4.6,
            "review_count": "12345",
            "image": LIVE,
            "source": "amazon_best_sellers"
        })),
    ])]);
    let probe = SpyProbe::new(&[(DEAD, 404), (LIVE, 200)]);
    let container = Arc::new(RecordingContainer::new());
    let orch = validated(store, probe.clone(), container.clone());

    let outcome = orch.start().await.unwrap();
    let LoadOutcome::Rendered { cards, .. } = outcome else {
        panic!("expected a rendered page, got {outcome:?}");
    };
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].product_id.as_str(), "C");
    assert_eq!(cards[0].title, "Wireless Mouse");
    assert_eq!(cards[0].review_count, "12,345");
    assert!(cards[0].is_bestseller);
    assert_eq!(orch.state(), LoadState::Rendered);

    // The bad host is rejected without a probe
    assert_eq!(probe.calls.load(Ordering::SeqCst), 2);

    let views = container.views();
    assert_eq!(views.first(), Some(&PageView::Loading));
    let html = PageRenderer::new("Deals").render_container(views.last().unwrap());
    assert_eq!(html.matches("class=\"product-card\"").count(), 1);
    assert!(html.contains("https://www.amazon.com/dp/C?tag=87868584-20"));
    assert!(!html.contains(EMPTY_MESSAGE));
    assert!(!html.contains(FETCH_FAILED_MESSAGE));
}

#[tokio::test]
async fn empty_catalog_offers_working_retry() {
    let store = ScriptedStore::new(vec![
        Ok(Vec::new()),
        Ok(vec![product("C", json!({ "title": "Back in stock", "image": LIVE }))]),
    ]);
    let probe = SpyProbe::new(&[(LIVE, 200)]);
    let container = Arc::new(RecordingContainer::new());
    let orch = validated(store.clone(), probe, container.clone());

    assert!(matches!(orch.start().await, Some(LoadOutcome::Empty { generation: 1 })));
    assert_eq!(orch.state(), LoadState::Empty);
    assert_eq!(container.last(), Some(PageView::Empty));

    let response = orch.handle(UiEvent::Retry).await;
    let EventResponse::Reloaded(LoadOutcome::Rendered { generation, cards }) = response else {
        panic!("retry should reload the page, got {response:?}");
    };
    assert_eq!(generation, 2);
    assert_eq!(cards.len(), 1);
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        container.views(),
        vec![
            PageView::Loading,
            PageView::Empty,
            PageView::Loading,
            PageView::Products(cards)
        ]
    );
}

#[tokio::test]
async fn all_images_rejected_is_empty_not_error() {
    let store = ScriptedStore::new(vec![Ok(vec![
        product("A", json!({ "image": "https://cdn.example.com/a.jpg" })),
        product("B", json!({ "title": "No image" })),
    ])]);
    let probe = SpyProbe::new(&[]);
    let container = Arc::new(RecordingContainer::new());
    let orch = validated(store, probe.clone(), container);

    orch.start().await;
    assert_eq!(orch.state(), LoadState::Empty);
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn store_failure_then_successful_retry() {
    let store = ScriptedStore::new(vec![
        Err(StorefrontError::StoreStatus {
            status: 503,
            message: "The service is currently unavailable.".to_string(),
        }),
        Ok(vec![product("C", json!({ "image": LIVE }))]),
    ]);
    let probe = SpyProbe::new(&[(LIVE, 200)]);
    let container = Arc::new(RecordingContainer::new());
    let orch = validated(store, probe, container.clone());

    let outcome = orch.start().await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Failed { .. }));
    assert_eq!(orch.state(), LoadState::Error);

    let failed = container.last().unwrap();
    assert!(failed.offers_retry());
    let html = PageRenderer::new("Deals").render_container(&failed);
    assert!(html.contains(FETCH_FAILED_MESSAGE));
    assert!(html.contains("data-action=\"retry\""));

    let response = orch.handle(UiEvent::Retry).await;
    assert!(matches!(response, EventResponse::Reloaded(LoadOutcome::Rendered { .. })));
    assert_eq!(orch.state(), LoadState::Rendered);
}

#[tokio::test]
async fn buy_opens_new_browsing_context() {
    let store = ScriptedStore::new(vec![Ok(vec![product("B07ZPKBL6V", json!({ "image": LIVE }))])]);
    let container = Arc::new(RecordingContainer::new());
    let orch = validated(store, SpyProbe::new(&[(LIVE, 200)]), container);
    orch.start().await;

    let response = orch
        .handle(UiEvent::Buy {
            product_id: ProductId::new("B07ZPKBL6V"),
        })
        .await;
    assert_eq!(
        response,
        EventResponse::Navigate(Navigation::NewBrowsingContext {
            url: "https://www.amazon.com/dp/B07ZPKBL6V?tag=87868584-20".to_string()
        })
    );
}

/// Holds the first fetch until released; later fetches return immediately
struct GatedStore {
    gate: Notify,
    calls: AtomicUsize,
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn fetch_recent(&self, _query: &RecentQuery) -> StorefrontResult<Vec<ProductDocument>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.gate.notified().await;
            Ok(vec![product("OLD", json!({ "image": LIVE }))])
        } else {
            Ok(vec![product("NEW", json!({ "image": LIVE }))])
        }
    }
}

#[tokio::test]
async fn superseded_cycle_is_discarded() {
    let store = Arc::new(GatedStore {
        gate: Notify::new(),
        calls: AtomicUsize::new(0),
    });
    let container = Arc::new(RecordingContainer::new());
    let orch = Arc::new(validated_with(store.clone(), container.clone()));

    let first = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.load().await })
    };
    while store.calls.load(Ordering::SeqCst) == 0 {
        tokio::task::yield_now().await;
    }

    let second = orch.load().await;
    assert!(matches!(second, LoadOutcome::Rendered { generation: 2, .. }));

    store.gate.notify_one();
    let first = first.await.unwrap();
    assert_eq!(first, LoadOutcome::Superseded { generation: 1 });

    let cards = orch.cards();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].product_id.as_str(), "NEW");
    assert_eq!(orch.generation(), 2);
    assert_eq!(container.last().map(|v| v.card_count()), Some(1));
}

fn validated_with(
    store: Arc<GatedStore>,
    container: Arc<RecordingContainer>,
) -> StorefrontOrchestrator {
    let probe = SpyProbe::new(&[(LIVE, 200)]);
    StorefrontOrchestrator::new(
        store,
        ImageStrategy::Validated(ImageValidator::new(probe, &ImageConfig::default())),
        CardBuilder::new(&RetailerConfig::default()),
        RecentQuery::default(),
        container,
    )
}

#[tokio::test]
async fn storage_variant_resolves_sequentially_with_placeholder() {
    let store = ScriptedStore::new(vec![Ok(vec![
        product("A", json!({ "title": "Has object" })),
        product("B", json!({ "title": "Missing object" })),
    ])]);
    let blobs = Arc::new(FakeBlobStore {
        objects: HashMap::from([(
            "products/A.jpg".to_string(),
            format!("{STORAGE}/v0/b/shop/o/products%2FA.jpg?alt=media&token=t"),
        )]),
        lookups: Mutex::new(Vec::new()),
    });
    let container = Arc::new(RecordingContainer::new());
    let orch = StorefrontOrchestrator::new(
        store,
        ImageStrategy::Storage(blobs.clone()),
        CardBuilder::new(&RetailerConfig::default()),
        RecentQuery::default(),
        container,
    );

    let LoadOutcome::Rendered { cards, .. } = orch.start().await.unwrap() else {
        panic!("storage variant should render both records");
    };
    assert_eq!(cards.len(), 2);
    assert!(cards[0].image_src.starts_with(STORAGE));
    assert_eq!(cards[1].image_src, cards[1].fallback_image_src);
    assert_eq!(
        *blobs.lookups.lock().unwrap(),
        vec!["products/A.jpg".to_string(), "products/B.jpg".to_string()]
    );
}

#[tokio::test]
async fn drive_stops_retrying_after_configured_attempts() {
    let store = ScriptedStore::new(vec![Err(StorefrontError::store_query("products", "offline"))]);
    let container = Arc::new(RecordingContainer::new());
    let orch = validated(store.clone(), SpyProbe::new(&[]), container);

    let page = PageConfig {
        auto_retry_attempts: 2,
        retry_delay_ms: 1,
        retry_jitter_ms: 0,
    };
    let state = drive(&orch, &page).await;
    assert_eq!(state, LoadState::Error);
    assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    assert_eq!(orch.generation(), 3);
}

#[tokio::test]
async fn drive_stops_once_rendered() {
    let store = ScriptedStore::new(vec![
        Ok(Vec::new()),
        Ok(vec![product("C", json!({ "image": LIVE }))]),
    ]);
    let container = Arc::new(RecordingContainer::new());
    let orch = validated(store.clone(), SpyProbe::new(&[(LIVE, 200)]), container);

    let page = PageConfig {
        auto_retry_attempts: 5,
        retry_delay_ms: 1,
        retry_jitter_ms: 0,
    };
    assert_eq!(drive(&orch, &page).await, LoadState::Rendered);
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);
}
