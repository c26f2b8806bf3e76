//! Configuration file loading tests

use std::io::Write;
use tempfile::NamedTempFile;

use affiliate_storefront_lib::infrastructure::config::{AppConfig, ConfigError, ImageSource};

fn config_file(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn toml_file_overrides_defaults() {
    let file = config_file(
        r#"
[backend]
project_id = "shop-1d33b"
api_key = "AIza-test"

[catalog]
page_size = 40

[images]
allowed_hosts = ["m.media-amazon.com"]
check_timeout_ms = 2500
max_concurrent_checks = 4

[output]
path = "public/index.html"
page_title = "Hot Deals"
"#,
        ".toml",
    );

    let config = AppConfig::load_from(file.path()).unwrap();
    assert_eq!(config.backend.project_id, "shop-1d33b");
    assert_eq!(config.backend.api_key.as_deref(), Some("AIza-test"));
    assert_eq!(config.backend.database, "(default)");
    assert_eq!(config.catalog.page_size, 40);
    assert_eq!(config.catalog.collection, "products");
    assert_eq!(config.images.allowed_hosts, vec!["m.media-amazon.com".to_string()]);
    assert_eq!(config.images.check_timeout().as_millis(), 2500);
    assert_eq!(config.images.source, ImageSource::Validated);
    assert_eq!(config.output.page_title, "Hot Deals");
    assert_eq!(config.retailer.affiliate_tag, "87868584-20");
}

#[test]
fn json_file_selects_storage_source() {
    let file = config_file(
        r#"{
  "backend": { "project_id": "shop", "storage_bucket": "shop.appspot.com" },
  "images": { "source": "storage" }
}"#,
        ".json",
    );

    let config = AppConfig::load_from(file.path()).unwrap();
    assert_eq!(config.images.source, ImageSource::Storage);
    assert_eq!(config.backend.storage_bucket.as_deref(), Some("shop.appspot.com"));
}

#[test]
fn oversized_page_is_rejected() {
    let file = config_file("[catalog]\npage_size = 250\n", ".toml");
    let err = AppConfig::load_from(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));
    assert!(err.to_string().contains("page_size"));
}

#[test]
fn empty_affiliate_tag_is_rejected() {
    let file = config_file("[retailer]\naffiliate_tag = \"  \"\n", ".toml");
    assert!(matches!(
        AppConfig::load_from(file.path()),
        Err(ConfigError::Validation { .. })
    ));
}

#[test]
fn unknown_image_source_fails_to_load() {
    let file = config_file("[images]\nsource = \"carrier-pigeon\"\n", ".toml");
    assert!(matches!(
        AppConfig::load_from(file.path()),
        Err(ConfigError::Load { .. })
    ));
}

#[test]
fn missing_file_fails_to_load() {
    let path = std::path::Path::new("/nonexistent/storefront.toml");
    let err = AppConfig::load_from(path).unwrap_err();
    assert!(matches!(err, ConfigError::Load { .. }));
}
