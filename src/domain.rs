//! Domain module - storefront catalog entities and rules
//!
//! Product records, their display formatting, the backend interfaces the
//! pipeline reads through, and the error taxonomy.

pub mod constants;
pub mod errors;
pub mod formatting;
pub mod product;
pub mod repositories;
pub mod services;

pub use errors::{StorefrontError, StorefrontResult};
pub use formatting::{clean_title, format_count};
pub use product::{FieldValue, ProductDocument, ProductId, ProductRecord};
pub use repositories::{BlobStore, DocumentStore, RecentQuery};
pub use services::ImageProbe;
