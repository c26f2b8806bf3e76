//! HTTP surface for the storefront page
//!
//! Serves the latest view at `/` and routes the page controls back into the
//! orchestrator: `POST /retry` re-runs the load cycle and `GET /buy/:id`
//! redirects to the product's purchase link.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::display::LivePage;
use crate::application::orchestrator::{
    EventResponse, Navigation, StorefrontOrchestrator, UiEvent,
};
use crate::domain::product::ProductId;
use crate::infrastructure::page_renderer::{PageRenderer, RETRY_PATH};

const NOT_ON_DISPLAY: &str = "Product is not on display";

#[derive(Clone)]
pub struct ServerState {
    /// `None` after an initialization failure; the page stays unavailable
    orchestrator: Option<Arc<StorefrontOrchestrator>>,
    page: Arc<LivePage>,
    renderer: PageRenderer,
}

impl ServerState {
    pub fn new(
        orchestrator: Option<Arc<StorefrontOrchestrator>>,
        page: Arc<LivePage>,
        renderer: PageRenderer,
    ) -> Self {
        Self {
            orchestrator,
            page,
            renderer: renderer.served(),
        }
    }

    pub fn orchestrator(&self) -> Option<&Arc<StorefrontOrchestrator>> {
        self.orchestrator.as_ref()
    }
}

pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route(RETRY_PATH, post(retry_handler))
        .route("/buy/:product_id", get(buy_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(state)
}

async fn page_handler(State(state): State<ServerState>) -> Html<String> {
    Html(state.renderer.render_document(&state.page.current()))
}

/// Runs the retry to completion, then sends the browser back to the page
async fn retry_handler(State(state): State<ServerState>) -> Redirect {
    match state.orchestrator() {
        Some(orchestrator) => match orchestrator.handle(UiEvent::Retry).await {
            EventResponse::Reloaded(outcome) => {
                info!("🔄 Retry from page finished cycle {}", outcome.generation());
            }
            _ => warn!("Retry request ignored in state {}", orchestrator.state()),
        },
        None => warn!("Retry request ignored: storefront is unavailable"),
    }
    Redirect::to("/")
}

async fn buy_handler(
    State(state): State<ServerState>,
    Path(product_id): Path<String>,
) -> Response {
    let Some(orchestrator) = state.orchestrator() else {
        return (StatusCode::NOT_FOUND, NOT_ON_DISPLAY).into_response();
    };
    let event = UiEvent::Buy {
        product_id: ProductId::new(product_id),
    };
    match orchestrator.handle(event).await {
        EventResponse::Navigate(Navigation::NewBrowsingContext { url }) => {
            Redirect::to(&url).into_response()
        }
        _ => (StatusCode::NOT_FOUND, NOT_ON_DISPLAY).into_response(),
    }
}

async fn healthz_handler() -> StatusCode {
    StatusCode::OK
}
