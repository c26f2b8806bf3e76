use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::domain::constants::display::{
    PRICE_PLACEHOLDER, RATING_PLACEHOLDER, REVIEW_COUNT_PLACEHOLDER,
};
use crate::domain::constants::images::{STORAGE_KEY_PREFIX, STORAGE_KEY_SUFFIX};
use crate::domain::formatting::{clean_title, format_count};

/// Opaque product identifier (document id)
///
/// Doubles as the retailer product code in purchase links and as the
/// object storage key stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Object storage key for this product's image: `products/{id}.jpg`
    #[must_use]
    pub fn storage_key(&self) -> String {
        format!("{STORAGE_KEY_PREFIX}{}{STORAGE_KEY_SUFFIX}", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A scalar the ingestion side stores either as text or as a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl FieldValue {
    /// Display text, or `None` for blank strings
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Text(s) if s.trim().is_empty() => None,
            other => Some(other.to_string()),
        }
    }

    fn is_zero(&self) -> bool {
        match self {
            Self::Integer(n) => *n == 0,
            Self::Float(n) => *n == 0.0,
            Self::Text(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s.trim()),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
        }
    }
}

/// Product record as stored in the catalog collection
///
/// Every field is optional; absent fields degrade to display placeholders
/// rather than failing the card.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRecord {
    #[serde(deserialize_with = "lenient_field")]
    pub title: Option<FieldValue>,
    #[serde(deserialize_with = "lenient_field")]
    pub price: Option<FieldValue>,
    #[serde(deserialize_with = "lenient_field")]
    pub rating: Option<FieldValue>,
    #[serde(deserialize_with = "lenient_field")]
    pub review_count: Option<FieldValue>,
    /// Direct image URL (or storage key)
    #[serde(deserialize_with = "lenient_text")]
    pub image: Option<String>,
    /// Legacy field written by older ingestion runs
    #[serde(deserialize_with = "lenient_text")]
    pub image_url: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub source: Option<String>,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ProductRecord {
    pub fn display_title(&self) -> String {
        let raw = self.title.as_ref().and_then(FieldValue::text).unwrap_or_default();
        clean_title(&raw).to_string()
    }

    pub fn display_price(&self) -> String {
        self.price
            .as_ref()
            .and_then(FieldValue::text)
            .unwrap_or_else(|| PRICE_PLACEHOLDER.to_string())
    }

    /// Rating text; a zero rating counts as "not rated yet"
    pub fn display_rating(&self) -> String {
        self.rating
            .as_ref()
            .filter(|r| !r.is_zero())
            .and_then(FieldValue::text)
            .unwrap_or_else(|| RATING_PLACEHOLDER.to_string())
    }

    pub fn display_review_count(&self) -> String {
        let raw = self
            .review_count
            .as_ref()
            .and_then(FieldValue::text)
            .unwrap_or_else(|| REVIEW_COUNT_PLACEHOLDER.to_string());
        format_count(&raw)
    }

    /// Image reference, preferring `image` over the legacy `image_url`
    pub fn image_reference(&self) -> Option<&str> {
        [self.image.as_deref(), self.image_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }

    pub fn is_bestseller(&self, marker: &str) -> bool {
        self.source.as_deref() == Some(marker)
    }
}

/// A record together with its document id
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDocument {
    pub id: ProductId,
    pub record: ProductRecord,
}

impl ProductDocument {
    pub fn new(id: ProductId, record: ProductRecord) -> Self {
        Self { id, record }
    }
}

/// Accepts RFC 3339 strings or epoch seconds; anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Some(serde_json::Value::Number(n)) => {
            n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0))
        }
        _ => None,
    })
}

/// Text or number as stored; booleans, lists and maps become `None`.
fn lenient_field<'de, D>(deserializer: D) -> Result<Option<FieldValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(FieldValue::Text(s)),
        Some(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(i) => Some(FieldValue::Integer(i)),
            None => n.as_f64().map(FieldValue::Float),
        },
        _ => None,
    })
}

/// Strings as-is, other scalars in their JSON spelling, anything else `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> ProductRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_fields_degrade_to_placeholders() {
        let r = record(json!({}));
        assert_eq!(r.display_title(), "");
        assert_eq!(r.display_price(), "N/A");
        assert_eq!(r.display_rating(), "?");
        assert_eq!(r.display_review_count(), "0");
        assert_eq!(r.image_reference(), None);
    }

    #[test]
    fn numeric_and_text_fields_are_accepted() {
        let r = record(json!({
            "title": "Echo Dot (3rd Gen) $49.99",
            "price": "$49.99",
            "rating": 4.7,
            "review_count": 100000,
            "image_url": "https://m.media-amazon.com/images/I/71Swqqe7XAL.jpg",
            "timestamp": "2024-05-01T12:00:00Z"
        }));
        assert_eq!(r.display_title(), "Echo Dot (3rd Gen)");
        assert_eq!(r.display_price(), "$49.99");
        assert_eq!(r.display_rating(), "4.7");
        assert_eq!(r.display_review_count(), "100,000");
        assert_eq!(
            r.image_reference(),
            Some("https://m.media-amazon.com/images/I/71Swqqe7XAL.jpg")
        );
        assert!(r.timestamp.is_some());
    }

    #[test]
    fn grouped_review_count_string() {
        let r = record(json!({ "review_count": "12,345", "rating": "4.5 out of 5" }));
        assert_eq!(r.display_review_count(), "12,345");
        assert_eq!(r.display_rating(), "4.5 out of 5");
    }

    #[test]
    fn blank_and_zero_values_count_as_absent() {
        let r = record(json!({ "price": "  ", "rating": 0, "image": "", "image_url": null }));
        assert_eq!(r.display_price(), "N/A");
        assert_eq!(r.display_rating(), "?");
        assert_eq!(r.image_reference(), None);
    }

    #[test]
    fn image_takes_precedence_over_legacy_field() {
        let r = record(json!({ "image": "https://a/1.jpg", "image_url": "https://b/2.jpg" }));
        assert_eq!(r.image_reference(), Some("https://a/1.jpg"));
    }

    #[test]
    fn unparseable_timestamp_is_dropped() {
        let r = record(json!({ "timestamp": "yesterday" }));
        assert_eq!(r.timestamp, None);
        let r = record(json!({ "timestamp": 1_714_564_800 }));
        assert!(r.timestamp.is_some());
    }

    #[test]
    fn bestseller_only_for_exact_marker() {
        let marker = "amazon_best_sellers";
        assert!(record(json!({ "source": marker })).is_bestseller(marker));
        assert!(!record(json!({ "source": "amazon_deals" })).is_bestseller(marker));
        assert!(!record(json!({ "source": "Amazon_Best_Sellers" })).is_bestseller(marker));
        assert!(!record(json!({})).is_bestseller(marker));
    }

    #[test]
    fn unexpected_field_types_degrade_instead_of_failing() {
        let r = record(json!({
            "title": true,
            "price": ["$1", "$2"],
            "rating": { "stars": 4 },
            "review_count": 120,
            "image": 5,
            "image_url": "https://m.media-amazon.com/images/I/x.jpg",
            "source": false
        }));
        assert_eq!(r.display_title(), "");
        assert_eq!(r.display_price(), "N/A");
        assert_eq!(r.display_rating(), "?");
        assert_eq!(r.display_review_count(), "120");
        assert_eq!(r.image_reference(), Some("5"));
        assert!(!r.is_bestseller("amazon_best_sellers"));

        let r = record(json!({ "image": { "nested": "x" }, "image_url": "https://a/1.jpg" }));
        assert_eq!(r.image_reference(), Some("https://a/1.jpg"));
    }

    #[test]
    fn storage_key_layout() {
        assert_eq!(ProductId::new("B07ZPKBL6V").storage_key(), "products/B07ZPKBL6V.jpg");
    }
}
