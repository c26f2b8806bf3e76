//! Display container abstraction
//!
//! The orchestrator owns exactly one container and replaces its whole
//! content on every transition. What "replace" means (a file on disk, the
//! in-memory page behind the web server) is up to the implementation.

use std::sync::{Mutex, PoisonError};

use crate::application::card_builder::ProductCard;
use crate::domain::errors::StorefrontResult;

pub const LOADING_MESSAGE: &str = "Loading deals...";
pub const EMPTY_MESSAGE: &str = "No products found.";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to load products. Please try again later.";
pub const UNAVAILABLE_MESSAGE: &str = "The store is temporarily unavailable.";

/// Full content of the container at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageView {
    Loading,
    Products(Vec<ProductCard>),
    Empty,
    Failed { message: String },
    /// Initialization failure; static, no retry control
    Unavailable { message: String },
}

impl PageView {
    pub fn offers_retry(&self) -> bool {
        matches!(self, Self::Empty | Self::Failed { .. })
    }

    pub fn card_count(&self) -> usize {
        match self {
            Self::Products(cards) => cards.len(),
            _ => 0,
        }
    }
}

pub trait DisplayContainer: Send + Sync {
    /// Replace the entire container content with `view`
    fn replace(&self, view: &PageView) -> StorefrontResult<()>;
}

/// Latest view only, read back by the web server on every request
#[derive(Debug)]
pub struct LivePage {
    view: Mutex<PageView>,
}

impl LivePage {
    pub fn new() -> Self {
        Self {
            view: Mutex::new(PageView::Loading),
        }
    }

    pub fn current(&self) -> PageView {
        self.view.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Default for LivePage {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayContainer for LivePage {
    fn replace(&self, view: &PageView) -> StorefrontResult<()> {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = view.clone();
        Ok(())
    }
}

/// Keeps every view it was given, in order
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingContainer {
    views: Mutex<Vec<PageView>>,
}

#[cfg(test)]
impl RecordingContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn views(&self) -> Vec<PageView> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn last(&self) -> Option<PageView> {
        self.views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}

#[cfg(test)]
impl DisplayContainer for RecordingContainer {
    fn replace(&self, view: &PageView) -> StorefrontResult<()> {
        self.views
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(view.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_empty_and_failed_offer_retry() {
        assert!(PageView::Empty.offers_retry());
        assert!(PageView::Failed { message: FETCH_FAILED_MESSAGE.into() }.offers_retry());
        assert!(!PageView::Loading.offers_retry());
        assert!(!PageView::Products(Vec::new()).offers_retry());
        assert!(!PageView::Unavailable { message: UNAVAILABLE_MESSAGE.into() }.offers_retry());
    }

    #[test]
    fn live_page_keeps_only_the_latest_view() {
        let page = LivePage::new();
        assert_eq!(page.current(), PageView::Loading);
        page.replace(&PageView::Empty).unwrap();
        page.replace(&PageView::Failed { message: FETCH_FAILED_MESSAGE.into() })
            .unwrap();
        assert!(page.current().offers_retry());
        assert_eq!(page.current().card_count(), 0);
    }

    #[test]
    fn recorder_keeps_history() {
        let container = RecordingContainer::new();
        container.replace(&PageView::Loading).unwrap();
        container.replace(&PageView::Empty).unwrap();
        assert_eq!(container.views(), vec![PageView::Loading, PageView::Empty]);
        assert_eq!(container.last(), Some(PageView::Empty));
    }
}
