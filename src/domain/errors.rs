//! Storefront error types
//!
//! One enum for every failure the load pipeline can observe. The variants
//! line up with the four failure classes the page distinguishes:
//! initialization (fatal), fetch (retriable), per-image checks (silently
//! excluded) and display updates.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum StorefrontError {
    #[error("Backend initialization failed: {message}")]
    Initialization { message: String },

    #[error("Document store query failed for collection '{collection}': {message}")]
    StoreQuery { collection: String, message: String },

    #[error("Document store returned HTTP {status}: {message}")]
    StoreStatus { status: u16, message: String },

    #[error("Failed to decode {what}: {message}")]
    Decode { what: String, message: String },

    #[error("Object '{key}' not found in bucket '{bucket}'")]
    ObjectNotFound { key: String, bucket: String },

    #[error("Object lookup failed for '{key}': {message}")]
    ObjectLookup { key: String, message: String },

    #[error("Image probe failed for {url}: {message}")]
    ImageProbe { url: String, message: String },

    #[error("Display container update failed: {message}")]
    Display { message: String },
}

impl StorefrontError {
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
        }
    }

    pub fn store_query(collection: &str, message: impl Into<String>) -> Self {
        Self::StoreQuery {
            collection: collection.to_string(),
            message: message.into(),
        }
    }

    pub fn decode(what: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            what: what.to_string(),
            message: message.into(),
        }
    }

    pub fn object_lookup(key: &str, message: impl Into<String>) -> Self {
        Self::ObjectLookup {
            key: key.to_string(),
            message: message.into(),
        }
    }

    pub fn image_probe(url: &str, message: impl Into<String>) -> Self {
        Self::ImageProbe {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn display(message: impl Into<String>) -> Self {
        Self::Display {
            message: message.into(),
        }
    }

    /// Whether a user retry can be expected to get past this error.
    ///
    /// Initialization failures are the only ones a retry would hit again.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Initialization { .. })
    }
}

pub type StorefrontResult<T> = Result<T, StorefrontError>;
