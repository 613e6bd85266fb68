//! Firestore typed values and documents.
//!
//! The REST API wraps every field in a single-key object naming its type
//! (`{"stringValue": "Arroz"}`). [`Value`] mirrors that encoding and
//! [`Document`] offers typed accessors on top of it.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::FirestoreError;

/// Field map of a document or map value.
pub type Fields = BTreeMap<String, Value>;

/// A typed Firestore value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    /// 64-bit integers travel as decimal strings.
    IntegerValue(String),
    DoubleValue(f64),
    /// RFC 3339 timestamp.
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: Fields,
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Self::StringValue(s.into())
    }

    #[must_use]
    pub fn timestamp(at: DateTime<Utc>) -> Self {
        Self::TimestampValue(at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn string_array<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ArrayValue(ArrayValue {
            values: items.into_iter().map(|s| Self::StringValue(s.into())).collect(),
        })
    }

    /// String content, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret as an instant.
    ///
    /// Accepts native timestamps, RFC 3339 strings and Unix milliseconds
    /// stored as integers or doubles.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::TimestampValue(s) | Self::StringValue(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::IntegerValue(s) => s
                .parse::<i64>()
                .ok()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
            #[allow(clippy::cast_possible_truncation)]
            Self::DoubleValue(ms) => Utc.timestamp_millis_opt(*ms as i64).single(),
            _ => None,
        }
    }
}

/// A stored document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name: `projects/{p}/databases/(default)/documents/{collection}/{id}`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default, skip_serializing)]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing)]
    pub update_time: Option<String>,
}

impl Document {
    /// Document body for writes.
    #[must_use]
    pub fn from_fields(fields: Fields) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Last segment of the resource name.
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or_default()
    }

    /// Optional string field.
    #[must_use]
    pub fn string(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Required string field.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Parse` if the field is missing or not a string.
    pub fn required_string(&self, field: &str) -> Result<&str, FirestoreError> {
        self.string(field).ok_or_else(|| self.missing(field))
    }

    /// Required timestamp field.
    ///
    /// # Errors
    ///
    /// Returns `FirestoreError::Parse` if the field is missing or not an instant.
    pub fn timestamp(&self, field: &str) -> Result<DateTime<Utc>, FirestoreError> {
        self.fields
            .get(field)
            .and_then(Value::as_timestamp)
            .ok_or_else(|| self.missing(field))
    }

    /// String elements of an array field; non-string elements are skipped.
    /// A missing field is an empty list.
    #[must_use]
    pub fn string_array(&self, field: &str) -> Vec<String> {
        match self.fields.get(field) {
            Some(Value::ArrayValue(array)) => array
                .values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn missing(&self, field: &str) -> FirestoreError {
        FirestoreError::Parse(format!("document '{}' has no valid '{field}'", self.id()))
    }
}
