//! Document store capability
//!
//! A minimal keyed document interface: one JSON object per `(collection, id)`.
//! Each call touches exactly one document and is atomic for that document.
//! Implementations resolve [`server_timestamp`] sentinels at write time so
//! creation times never come from the caller's clock.

use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A stored document: a flat JSON object
pub type Document = Map<String, Value>;

const SERVER_TIMESTAMP_KEY: &str = "$serverTimestamp";

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create or replace the document at `collection/id`
    async fn put(&self, collection: &str, id: &str, document: Document) -> StoreResult<()>;

    /// Fetch the document at `collection/id`, `None` if absent
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Remove the document at `collection/id`; absent documents are not an error
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

/// Sentinel field value replaced by the store's clock when written
pub fn server_timestamp() -> Value {
    let mut marker = Map::new();
    marker.insert(SERVER_TIMESTAMP_KEY.to_string(), Value::Bool(true));
    Value::Object(marker)
}

pub fn is_server_timestamp(value: &Value) -> bool {
    matches!(
        value.as_object(),
        Some(obj) if obj.len() == 1 && obj.get(SERVER_TIMESTAMP_KEY) == Some(&Value::Bool(true))
    )
}

/// Replace every top-level sentinel with `now` as an RFC 3339 string
pub fn resolve_server_timestamps(document: &mut Document, now: DateTime<Utc>) {
    let stamp = Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true));
    for value in document.values_mut() {
        if is_server_timestamp(value) {
            *value = stamp.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sentinel_detection() {
        assert!(is_server_timestamp(&server_timestamp()));
        assert!(!is_server_timestamp(&Value::String("2024-01-01".into())));
        assert!(!is_server_timestamp(&serde_json::json!({ "$serverTimestamp": false })));
    }

    #[test]
    fn test_resolve_replaces_only_sentinels() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut doc = Document::new();
        doc.insert("createdAt".into(), server_timestamp());
        doc.insert("location".into(), Value::String("partner-logo".into()));

        resolve_server_timestamps(&mut doc, now);

        assert_eq!(doc["createdAt"], Value::String("2024-01-01T12:00:00.000000Z".into()));
        assert_eq!(doc["location"], Value::String("partner-logo".into()));
    }
}
