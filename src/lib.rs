//! Affiliate Storefront
//!
//! Fetches the most recent product records from a Firestore collection,
//! checks their images and renders a grid of product cards with affiliate
//! purchase links, either into a static HTML page or behind a small web
//! server whose retry and buy controls reach the orchestrator.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod utils;

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::application::display::{DisplayContainer, LivePage, PageView, UNAVAILABLE_MESSAGE};
use crate::application::{LoadState, StorefrontContext, StorefrontOrchestrator, UiEvent};
use crate::infrastructure::config::{AppConfig, PageConfig};
use crate::infrastructure::{build_router, HtmlFileContainer, PageRenderer, ServerState};

/// What a run of the storefront left on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// `false` when backend clients could not be constructed
    pub initialized: bool,
    pub state: LoadState,
    pub cycles: u64,
    pub cards: usize,
    pub output: PathBuf,
}

/// Initialize, load once, then retry automatically while configured to.
pub async fn run(config: &AppConfig) -> anyhow::Result<RunReport> {
    let renderer = PageRenderer::new(config.output.page_title.clone());
    let container = Arc::new(HtmlFileContainer::new(&config.output.path, renderer));
    let output = container.path().to_path_buf();

    let context = match StorefrontContext::initialize(config) {
        Ok(context) => context,
        Err(e) => {
            error!("❌ {}", e);
            container
                .replace(&PageView::Unavailable {
                    message: UNAVAILABLE_MESSAGE.to_string(),
                })
                .context("Failed to write initialization error page")?;
            return Ok(RunReport {
                initialized: false,
                state: LoadState::Idle,
                cycles: 0,
                cards: 0,
                output,
            });
        }
    };

    let orchestrator = context.into_orchestrator(container);
    let state = drive(&orchestrator, &config.page).await;

    Ok(RunReport {
        initialized: true,
        state,
        cycles: orchestrator.generation(),
        cards: orchestrator.cards().len(),
        output,
    })
}

/// Initialize and start loading in the background; the state backs the router.
///
/// Must be called from within a Tokio runtime.
pub fn prepare_server(config: &AppConfig) -> anyhow::Result<ServerState> {
    let page = Arc::new(LivePage::new());
    let renderer = PageRenderer::new(config.output.page_title.clone());

    let orchestrator = match StorefrontContext::initialize(config) {
        Ok(context) => {
            let orchestrator = Arc::new(context.into_orchestrator(page.clone()));
            let loader = Arc::clone(&orchestrator);
            let page_config = config.page.clone();
            tokio::spawn(async move {
                let state = drive(&loader, &page_config).await;
                info!("Initial load settled in {} state", state);
            });
            Some(orchestrator)
        }
        Err(e) => {
            error!("❌ {}", e);
            page.replace(&PageView::Unavailable {
                message: UNAVAILABLE_MESSAGE.to_string(),
            })?;
            None
        }
    };

    Ok(ServerState::new(orchestrator, page, renderer))
}

/// Serve the page on `server.bind` until Ctrl+C
pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.server.bind_addr()?;
    let app = build_router(prepare_server(config)?);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🌐 Serving storefront on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }
}

/// Start signal plus up to `auto_retry_attempts` jittered retries.
///
/// Retries go through the same event path as the page's retry control, so a
/// static page is regenerated in place while it shows the empty or error view.
pub async fn drive(orchestrator: &StorefrontOrchestrator, page: &PageConfig) -> LoadState {
    orchestrator.start().await;

    let mut attempt = 0;
    while orchestrator.state().can_retry() && attempt < page.auto_retry_attempts {
        attempt += 1;
        let delay = retry_delay(page);
        info!(
            "⏳ Automatic retry {}/{} in {:?}",
            attempt, page.auto_retry_attempts, delay
        );
        tokio::time::sleep(delay).await;
        orchestrator.handle(UiEvent::Retry).await;
    }

    orchestrator.state()
}

fn retry_delay(page: &PageConfig) -> Duration {
    let jitter = if page.retry_jitter_ms == 0 {
        0
    } else {
        fastrand::u64(0..=page.retry_jitter_ms)
    };
    Duration::from_millis(page.retry_delay_ms.saturating_add(jitter))
}
