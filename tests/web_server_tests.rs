//! Served page tests: real HTTP against the router on a loopback port

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use affiliate_storefront_lib::application::display::{
    LivePage, FETCH_FAILED_MESSAGE, UNAVAILABLE_MESSAGE,
};
use affiliate_storefront_lib::application::{
    CardBuilder, ImageStrategy, LoadState, StorefrontOrchestrator,
};
use affiliate_storefront_lib::domain::{
    BlobStore, DocumentStore, ProductDocument, ProductId, ProductRecord, RecentQuery,
    StorefrontError, StorefrontResult,
};
use affiliate_storefront_lib::infrastructure::config::{AppConfig, RetailerConfig};
use affiliate_storefront_lib::infrastructure::{build_router, PageRenderer, ServerState};
use affiliate_storefront_lib::prepare_server;

/// Fails the first fetch, then returns one product
struct FlakyStore {
    responses: Mutex<VecDeque<StorefrontResult<Vec<ProductDocument>>>>,
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn fetch_recent(&self, _query: &RecentQuery) -> StorefrontResult<Vec<ProductDocument>> {
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses.front().cloned().unwrap()
        }
    }
}

struct StaticBlobs;

#[async_trait]
impl BlobStore for StaticBlobs {
    async fn resolve_url(&self, key: &str) -> StorefrontResult<String> {
        Ok(format!("https://firebasestorage.googleapis.com/{key}"))
    }
}

async fn spawn_server(state: ServerState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn retry_and_buy_controls_reach_the_orchestrator() {
    let store = Arc::new(FlakyStore {
        responses: Mutex::new(VecDeque::from([
            Err(StorefrontError::store_query("products", "connection reset")),
            Ok(vec![ProductDocument::new(
                ProductId::new("B07ZPKBL6V"),
                ProductRecord::default(),
            )]),
        ])),
    });
    let page = Arc::new(LivePage::new());
    let orchestrator = Arc::new(StorefrontOrchestrator::new(
        store,
        ImageStrategy::Storage(Arc::new(StaticBlobs)),
        CardBuilder::new(&RetailerConfig::default()),
        RecentQuery::default(),
        page.clone(),
    ));
    orchestrator.start().await;
    assert_eq!(orchestrator.state(), LoadState::Error);

    let state = ServerState::new(Some(orchestrator.clone()), page, PageRenderer::new("Deals"));
    let base = format!("http://{}", spawn_server(state).await);
    let http = client();

    let html = http.get(&base).send().await.unwrap().text().await.unwrap();
    assert!(html.contains(FETCH_FAILED_MESSAGE));
    assert!(html.contains("<form method=\"post\" action=\"/retry\">"));

    let response = http.post(format!("{base}/retry")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/");
    assert_eq!(orchestrator.state(), LoadState::Rendered);
    assert_eq!(orchestrator.generation(), 2);

    let html = http.get(&base).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("class=\"product-card\""));
    assert!(html.contains("href=\"/buy/B07ZPKBL6V\""));

    let response = http.get(format!("{base}/buy/B07ZPKBL6V")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers()["location"],
        "https://www.amazon.com/dp/B07ZPKBL6V?tag=87868584-20"
    );

    let response = http.get(format!("{base}/buy/NOT-LISTED")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // A rendered page has nothing to retry
    http.post(format!("{base}/retry")).send().await.unwrap();
    assert_eq!(orchestrator.generation(), 2);
}

#[tokio::test]
async fn initialization_failure_serves_unavailable_page() {
    let state = prepare_server(&AppConfig::default()).unwrap();
    assert!(state.orchestrator().is_none());
    let base = format!("http://{}", spawn_server(state).await);
    let http = client();

    let html = http.get(&base).send().await.unwrap().text().await.unwrap();
    assert!(html.contains(UNAVAILABLE_MESSAGE));
    assert!(!html.contains("data-action=\"retry\""));

    let response = http.post(format!("{base}/retry")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = http.get(format!("{base}/buy/B07ZPKBL6V")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let health = http.get(format!("{base}/healthz")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}
