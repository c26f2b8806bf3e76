//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate, later sources winning:
//! 1. Compiled defaults (every section is `#[serde(default)]`)
//! 2. User config file: `<config_dir>/affiliate-storefront/storefront.{toml,json,yaml}`
//! 3. Working directory file: `config/storefront.{toml,json,yaml}`
//! 4. Environment: `STOREFRONT__SECTION__KEY` (e.g. `STOREFRONT__BACKEND__PROJECT_ID`)
//!
//! Backend credentials are expected to arrive through 2–4; nothing here is
//! ever written back.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::domain::constants::{catalog, images, retailer};
use crate::domain::repositories::RecentQuery;

pub const APP_DIR_NAME: &str = "affiliate-storefront";
pub const ENV_PREFIX: &str = "STOREFRONT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub catalog: CatalogConfig,
    pub images: ImageConfig,
    pub retailer: RetailerConfig,
    pub http: HttpClientConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
    pub page: PageConfig,
    pub server: ServerConfig,
}

/// Managed backend (document store + object storage) connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Cloud project that owns the catalog. Required.
    pub project_id: String,

    /// Web API key, appended as `?key=` when present
    pub api_key: Option<String>,

    pub database: String,

    pub firestore_base_url: String,

    /// Object storage bucket; only needed for `images.source = "storage"`
    pub storage_bucket: Option<String>,

    pub storage_base_url: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: None,
            database: "(default)".to_string(),
            firestore_base_url: "https://firestore.googleapis.com".to_string(),
            storage_bucket: None,
            storage_base_url: "https://firebasestorage.googleapis.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub collection: String,
    pub order_field: String,
    /// Records per load cycle, capped at `catalog::MAX_PAGE_SIZE`
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            collection: catalog::COLLECTION.to_string(),
            order_field: catalog::ORDER_FIELD.to_string(),
            page_size: catalog::MAX_PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    pub fn recent_query(&self) -> RecentQuery {
        RecentQuery {
            collection: self.collection.clone(),
            order_field: self.order_field.clone(),
            limit: self.page_size,
        }
    }
}

/// Where card images come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// Record's own image URL, allow-listed and liveness-checked
    Validated,
    /// Object storage by product key, resolved sequentially
    Storage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub source: ImageSource,
    pub allowed_hosts: Vec<String>,
    pub check_timeout_ms: u64,
    pub max_concurrent_checks: usize,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            source: ImageSource::Validated,
            allowed_hosts: images::DEFAULT_ALLOWED_HOSTS
                .iter()
                .map(|h| (*h).to_string())
                .collect(),
            check_timeout_ms: images::DEFAULT_CHECK_TIMEOUT_MS,
            max_concurrent_checks: images::DEFAULT_MAX_CONCURRENT_CHECKS,
        }
    }
}

impl ImageConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetailerConfig {
    pub base_url: String,
    pub affiliate_tag: String,
    pub bestseller_source: String,
}

impl Default for RetailerConfig {
    fn default() -> Self {
        Self {
            base_url: retailer::BASE_URL.to_string(),
            affiliate_tag: retailer::AFFILIATE_TAG.to_string(),
            bestseller_source: retailer::BESTSELLER_SOURCE.to_string(),
        }
    }
}

/// HTTP client behavior shared by every backend request and image probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("affiliate-storefront/{}", env!("CARGO_PKG_VERSION")),
            timeout_seconds: 30,
            max_requests_per_second: 50,
            follow_redirects: true,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            file_name: "storefront.log".to_string(),
        }
    }
}

/// Rendered page destination
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub page_title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dist/index.html"),
            page_title: "Today's Deals".to_string(),
        }
    }
}

/// Unattended retry behavior of the binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Retries issued while the page sits in the empty or error state
    pub auto_retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub retry_jitter_ms: u64,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            auto_retry_attempts: 3,
            retry_delay_ms: 2_000,
            retry_jitter_ms: 500,
        }
    }
}

/// Serve the page over HTTP instead of writing `output.path`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,
    /// `host:port` to listen on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|e| ConfigError::Validation {
            message: format!("server.bind '{}' is not a socket address: {e}", self.bind),
        })
    }
}

impl AppConfig {
    /// Directory holding the user config file
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
    }

    /// Load from the standard locations plus environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(dir) = Self::config_dir() {
            let user_file = dir.join("storefront");
            builder = builder.add_source(
                config::File::with_name(&user_file.to_string_lossy()).required(false),
            );
        }
        builder = builder.add_source(config::File::with_name("config/storefront").required(false));

        Self::finish(builder)
    }

    /// Load a specific file (extension picks the format) plus environment overrides
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = config::Config::builder().add_source(config::File::from(path));
        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("images.allowed_hosts")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!(
            "Configuration loaded (collection={}, image_source={:?}, output={:?}, serve={})",
            config.catalog.collection,
            config.images.source,
            config.output.path,
            config.server.enabled
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn fail(message: impl Into<String>) -> Result<(), ConfigError> {
            Err(ConfigError::Validation {
                message: message.into(),
            })
        }

        if self.catalog.page_size == 0 || self.catalog.page_size > catalog::MAX_PAGE_SIZE {
            return fail(format!(
                "catalog.page_size must be between 1 and {}",
                catalog::MAX_PAGE_SIZE
            ));
        }
        if self.catalog.collection.trim().is_empty() {
            return fail("catalog.collection must not be empty");
        }
        if self.images.max_concurrent_checks == 0 {
            return fail("images.max_concurrent_checks must be greater than 0");
        }
        if self.images.check_timeout_ms == 0 {
            return fail("images.check_timeout_ms must be greater than 0");
        }
        if self.http.timeout_seconds == 0 {
            return fail("http.timeout_seconds must be greater than 0");
        }
        if self.http.max_requests_per_second == 0 {
            return fail("http.max_requests_per_second must be greater than 0");
        }
        if self.retailer.affiliate_tag.trim().is_empty() {
            return fail("retailer.affiliate_tag must not be empty");
        }
        if !self.logging.console_output && !self.logging.file_output {
            return fail("logging needs console_output or file_output enabled");
        }
        if self.server.enabled {
            self.server.bind_addr()?;
        }

        Ok(())
    }
}
