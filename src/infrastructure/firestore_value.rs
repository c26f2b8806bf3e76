//! Firestore REST value decoding
//!
//! The REST API wraps every field in a single-key object naming its type
//! (`{"stringValue": "..."}`, `{"integerValue": "42"}`, ...). These types
//! unwrap that into plain JSON so product records can be deserialized with
//! ordinary serde derives.

use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirestoreValue {
    NullValue(Option<()>),
    BooleanValue(bool),
    /// int64 values arrive as decimal strings
    IntegerValue(String),
    /// Usually a number; non-finite values arrive as `"NaN"`/`"Infinity"`
    DoubleValue(Value),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FirestoreValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, FirestoreValue>,
}

impl FirestoreValue {
    pub fn into_json(self) -> Value {
        match self {
            Self::NullValue(_) => Value::Null,
            Self::BooleanValue(b) => Value::Bool(b),
            Self::IntegerValue(raw) => raw
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .unwrap_or(Value::String(raw)),
            Self::DoubleValue(v) => match v {
                Value::Number(_) => v,
                Value::String(s) => s
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map_or(Value::Null, Value::Number),
                _ => Value::Null,
            },
            Self::TimestampValue(s)
            | Self::StringValue(s)
            | Self::BytesValue(s)
            | Self::ReferenceValue(s) => Value::String(s),
            Self::GeoPointValue(v) => v,
            Self::ArrayValue(array) => {
                Value::Array(array.values.into_iter().map(Self::into_json).collect())
            }
            Self::MapValue(map) => Value::Object(fields_into_json(map.fields)),
        }
    }
}

pub fn fields_into_json(fields: HashMap<String, FirestoreValue>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(name, value)| (name, value.into_json()))
        .collect()
}

/// A stored document as returned by the REST API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreDocument {
    /// `projects/{p}/databases/{d}/documents/{collection}/{id}`
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, FirestoreValue>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

impl FirestoreDocument {
    /// Last path segment of the resource name
    pub fn document_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// One element of a `documents:runQuery` response stream
///
/// An empty result set still yields a single element carrying only
/// `readTime`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRow {
    pub document: Option<FirestoreDocument>,
    pub read_time: Option<String>,
    pub skipped_results: Option<i64>,
}
