//! Storefront domain constants
//!
//! Fixed characteristics of the catalog, the image CDN and the retailer the
//! storefront links to. Everything here can be overridden through
//! configuration except the hard result cap.

/// Product catalog (document store) characteristics
pub mod catalog {
    /// Collection holding the product documents
    pub const COLLECTION: &str = "products";

    /// Server-assigned field used for recency ordering
    pub const ORDER_FIELD: &str = "timestamp";

    /// Hard cap on records fetched per load cycle. There is no pagination.
    pub const MAX_PAGE_SIZE: u32 = 100;
}

/// Product image sources
pub mod images {
    /// Approved image CDN host substrings
    pub const DEFAULT_ALLOWED_HOSTS: [&str; 3] = [
        "images-na.ssl-images-amazon.com",
        "m.media-amazon.com",
        "images-amazon.com",
    ];

    /// Object storage key layout: `products/{identifier}.jpg`
    pub const STORAGE_KEY_PREFIX: &str = "products/";
    pub const STORAGE_KEY_SUFFIX: &str = ".jpg";

    pub const DEFAULT_CHECK_TIMEOUT_MS: u64 = 5_000;
    pub const DEFAULT_MAX_CONCURRENT_CHECKS: usize = 16;
}

/// Outbound retailer links
pub mod retailer {
    pub const BASE_URL: &str = "https://www.amazon.com";

    pub const AFFILIATE_TAG: &str = "87868584-20";

    /// `source` tag value that marks a record as a bestseller
    pub const BESTSELLER_SOURCE: &str = "amazon_best_sellers";
}

/// Card display placeholders
pub mod display {
    /// Upstream titles sometimes carry a price suffix after this character
    pub const TITLE_DELIMITER: char = '$';

    pub const PRICE_PLACEHOLDER: &str = "N/A";
    pub const RATING_PLACEHOLDER: &str = "?";
    pub const REVIEW_COUNT_PLACEHOLDER: &str = "0";
}
