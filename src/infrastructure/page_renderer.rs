//! HTML rendering of page views
//!
//! Every interpolated value goes through `html_escape`; card text and URLs
//! come straight from the catalog and are never trusted.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::application::card_builder::ProductCard;
use crate::application::display::{PageView, EMPTY_MESSAGE, LOADING_MESSAGE};
use crate::utils::encode_path_segment;

pub const CONTAINER_ID: &str = "product-grid";

const STYLESHEET: &str = r#"
* { box-sizing: border-box; }
body {
  margin: 0;
  font-family: -apple-system, "Segoe UI", Roboto, Arial, sans-serif;
  background: #f5f5f5;
  color: #222;
}
header { background: #232f3e; color: #fff; padding: 16px 24px; }
header h1 { margin: 0; font-size: 1.5rem; }
#product-grid {
  display: grid;
  grid-template-columns: repeat(auto-fill, minmax(240px, 1fr));
  gap: 20px;
  padding: 24px;
  max-width: 1400px;
  margin: 0 auto;
}
.product-card {
  position: relative;
  background: #fff;
  border-radius: 8px;
  padding: 16px;
  display: flex;
  flex-direction: column;
  box-shadow: 0 1px 4px rgba(0, 0, 0, 0.08);
}
.product-card img { width: 100%; height: 220px; object-fit: contain; margin-bottom: 12px; }
.product-card h3 { font-size: 1rem; margin: 0 0 8px; line-height: 1.3; }
.price { font-size: 1.2rem; font-weight: bold; color: #b12704; margin: 0 0 6px; }
.rating { color: #555; margin: 0 0 12px; }
.bestseller-badge {
  position: absolute;
  top: 10px;
  left: 10px;
  background: #e47911;
  color: #fff;
  font-size: 0.75rem;
  font-weight: bold;
  padding: 4px 8px;
  border-radius: 4px;
}
.buy-button {
  margin-top: auto;
  display: block;
  text-align: center;
  background: #ffd814;
  color: #111;
  text-decoration: none;
  padding: 10px;
  border-radius: 20px;
  font-weight: bold;
}
.buy-button:hover { background: #f7ca00; }
.loading, .empty-state, .error-state {
  grid-column: 1 / -1;
  text-align: center;
  padding: 60px 20px;
}
.error-state p { color: #b12704; }
.spinner {
  width: 40px;
  height: 40px;
  margin: 0 auto 16px;
  border: 4px solid #ddd;
  border-top-color: #e47911;
  border-radius: 50%;
  animation: spin 1s linear infinite;
}
@keyframes spin { to { transform: rotate(360deg); } }
.retry-button {
  background: #232f3e;
  color: #fff;
  border: 0;
  padding: 10px 24px;
  border-radius: 4px;
  cursor: pointer;
}
@media (max-width: 600px) {
  #product-grid { grid-template-columns: repeat(2, 1fr); gap: 12px; padding: 12px; }
  .product-card img { height: 150px; }
}
"#;

/// Image fallback plus the reload behind a static retry button
const PAGE_SCRIPT: &str = r#"
document.addEventListener('error', function (event) {
  var img = event.target;
  if (img.tagName === 'IMG' && img.dataset.fallbackSrc
      && img.getAttribute('src') !== img.dataset.fallbackSrc) {
    img.src = img.dataset.fallbackSrc;
  }
}, true);
document.addEventListener('click', function (event) {
  var control = event.target.closest('button[type="button"][data-action="retry"]');
  if (control) {
    window.location.reload();
  }
});
"#;

pub const RETRY_PATH: &str = "/retry";
pub const BUY_PATH_PREFIX: &str = "/buy/";

/// Where page controls lead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Written to disk; retry reloads whatever the binary last wrote and buy
    /// links go straight to the retailer
    Static,
    /// Served by the web server; retry posts to it and buy goes through it
    Served,
}

#[derive(Debug, Clone)]
pub struct PageRenderer {
    page_title: String,
    controls: ControlMode,
}

impl PageRenderer {
    pub fn new(page_title: impl Into<String>) -> Self {
        Self {
            page_title: page_title.into(),
            controls: ControlMode::Static,
        }
    }

    #[must_use]
    pub fn served(mut self) -> Self {
        self.controls = ControlMode::Served;
        self
    }

    /// Complete standalone document
    pub fn render_document(&self, view: &PageView) -> String {
        let title = text(&self.page_title);
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title}</title>\n<style>{STYLESHEET}</style>\n</head>\n<body>\n\
<header><h1>{title}</h1></header>\n\
<main id=\"{CONTAINER_ID}\">\n{}</main>\n<script>{PAGE_SCRIPT}</script>\n</body>\n</html>\n",
            self.render_container(view)
        )
    }

    /// Inner content of the product grid
    pub fn render_container(&self, view: &PageView) -> String {
        match view {
            PageView::Loading => format!(
                "<div class=\"loading\"><div class=\"spinner\"></div><p>{}</p></div>\n",
                text(LOADING_MESSAGE)
            ),
            PageView::Products(cards) => cards.iter().map(|card| self.render_card(card)).collect(),
            PageView::Empty => format!(
                "<div class=\"empty-state\"><p>{}</p>{}</div>\n",
                text(EMPTY_MESSAGE),
                self.retry_control("Try Again")
            ),
            PageView::Failed { message } => format!(
                "<div class=\"error-state\"><p>{}</p>{}</div>\n",
                text(message),
                self.retry_control("Retry")
            ),
            PageView::Unavailable { message } => {
                format!("<div class=\"error-state\"><p>{}</p></div>\n", text(message))
            }
        }
    }

    fn retry_control(&self, label: &str) -> String {
        match self.controls {
            ControlMode::Static => format!(
                "<button type=\"button\" class=\"retry-button\" data-action=\"retry\">{}</button>",
                text(label)
            ),
            ControlMode::Served => format!(
                "<form method=\"post\" action=\"{RETRY_PATH}\">\
<button type=\"submit\" class=\"retry-button\" data-action=\"retry\">{}</button></form>",
                text(label)
            ),
        }
    }

    fn buy_href(&self, card: &ProductCard) -> String {
        match self.controls {
            ControlMode::Static => card.purchase_url.clone(),
            ControlMode::Served => {
                format!("{BUY_PATH_PREFIX}{}", encode_path_segment(card.product_id.as_str()))
            }
        }
    }

    pub fn render_card(&self, card: &ProductCard) -> String {
        let mut html = String::with_capacity(1024);
        html.push_str(&format!(
            "<div class=\"product-card\" data-product-id=\"{}\">\n",
            attr(card.product_id.as_str())
        ));
        if card.is_bestseller {
            html.push_str("  <span class=\"bestseller-badge\">🔥 Bestseller</span>\n");
        }
        html.push_str(&format!(
            "  <img src=\"{}\" alt=\"{}\" loading=\"lazy\" data-fallback-src=\"{}\">\n",
            attr(&card.image_src),
            attr(&card.title),
            attr(&card.fallback_image_src)
        ));
        html.push_str(&format!("  <h3>{}</h3>\n", text(&card.title)));
        html.push_str(&format!("  <p class=\"price\">{}</p>\n", text(&card.price)));
        html.push_str(&format!(
            "  <p class=\"rating\">⭐ {} | {} reviews</p>\n",
            text(&card.rating),
            text(&card.review_count)
        ));
        html.push_str(&format!(
            "  <a class=\"buy-button\" href=\"{}\" target=\"_blank\" \
rel=\"noopener noreferrer sponsored\">Buy Now</a>\n",
            attr(&self.buy_href(card))
        ));
        html.push_str("</div>\n");
        html
    }
}
