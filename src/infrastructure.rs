//! Infrastructure layer
//!
//! Backend clients (document store, object storage, image probes), the
//! HTTP client they share, configuration, logging, HTML output and the
//! web server that can serve the page instead.

pub mod config;
pub mod firestore_store;
pub mod firestore_value;
pub mod html_container;
pub mod http_client;
pub mod image_probe;
pub mod logging;
pub mod page_renderer;
pub mod storage_blob_store;
pub mod web_server;

pub use config::{AppConfig, ConfigError, ImageSource};
pub use firestore_store::FirestoreDocumentStore;
pub use html_container::HtmlFileContainer;
pub use http_client::HttpClient;
pub use image_probe::HttpImageProbe;
pub use logging::{init_logging_with_config, log_system_info};
pub use page_renderer::PageRenderer;
pub use storage_blob_store::FirebaseStorageBlobStore;
pub use web_server::{build_router, ServerState};
