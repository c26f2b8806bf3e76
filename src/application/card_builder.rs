//! Product card construction
//!
//! Turns a surviving record into the view data of one card. Escaping happens
//! at render time; everything here is plain text.

use serde::Serialize;

use crate::domain::product::{ProductDocument, ProductId};
use crate::infrastructure::config::RetailerConfig;
use crate::utils::{encode_path_segment, encode_uri_component};

/// Inline placeholder shown when a card image is missing or fails to load
const PLACEHOLDER_SVG: &str = concat!(
    "<svg xmlns='http://www.w3.org/2000/svg' width='300' height='300' viewBox='0 0 300 300'>",
    "<rect width='300' height='300' fill='#f0f0f0'/>",
    "<text x='150' y='150' font-family='Arial, sans-serif' font-size='18' fill='#999' ",
    "text-anchor='middle' dominant-baseline='middle'>No Image Available</text>",
    "</svg>"
);

pub fn placeholder_image_data_url() -> String {
    format!("data:image/svg+xml;charset=UTF-8,{}", encode_uri_component(PLACEHOLDER_SVG))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCard {
    pub product_id: ProductId,
    pub title: String,
    pub price: String,
    pub rating: String,
    pub review_count: String,
    pub image_src: String,
    /// Swapped in client-side if `image_src` fails after insertion
    pub fallback_image_src: String,
    pub is_bestseller: bool,
    pub purchase_url: String,
}

#[derive(Debug, Clone)]
pub struct CardBuilder {
    base_url: String,
    affiliate_tag: String,
    bestseller_source: String,
    placeholder: String,
}

impl CardBuilder {
    pub fn new(retailer: &RetailerConfig) -> Self {
        Self {
            base_url: retailer.base_url.trim_end_matches('/').to_string(),
            affiliate_tag: retailer.affiliate_tag.clone(),
            bestseller_source: retailer.bestseller_source.clone(),
            placeholder: placeholder_image_data_url(),
        }
    }

    /// `{base}/dp/{id}?tag={tag}` with the id confined to one path segment
    pub fn purchase_url(&self, id: &ProductId) -> String {
        format!(
            "{}/dp/{}?tag={}",
            self.base_url,
            encode_path_segment(id.as_str()),
            encode_uri_component(&self.affiliate_tag)
        )
    }

    /// Build a card. `image_src` of `None` renders the placeholder directly.
    pub fn build(&self, document: &ProductDocument, image_src: Option<String>) -> ProductCard {
        let record = &document.record;
        ProductCard {
            product_id: document.id.clone(),
            title: record.display_title(),
            price: record.display_price(),
            rating: record.display_rating(),
            review_count: record.display_review_count(),
            image_src: image_src.unwrap_or_else(|| self.placeholder.clone()),
            fallback_image_src: self.placeholder.clone(),
            is_bestseller: record.is_bestseller(&self.bestseller_source),
            purchase_url: self.purchase_url(&document.id),
        }
    }
}
