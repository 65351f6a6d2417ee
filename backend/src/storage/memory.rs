//! In-memory document store
//!
//! Non-persistent [`DocumentStore`] used by tests and throwaway runs.
//! Tracks the number of writes so callers can assert that rejected
//! requests never reached the store.

use super::document_store::{resolve_server_timestamps, Document, DocumentStore};
use crate::error::StoreResult;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<(String, String), Document>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `put` calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of documents across all collections
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn put(&self, collection: &str, id: &str, mut document: Document) -> StoreResult<()> {
        resolve_server_timestamps(&mut document, Utc::now());

        self.documents
            .write()
            .await
            .insert((collection.to_string(), id.to_string()), document);
        self.writes.fetch_add(1, Ordering::SeqCst);

        tracing::debug!("Stored document {}/{} in memory", collection, id);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.documents
            .write()
            .await
            .remove(&(collection.to_string(), id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::document_store::server_timestamp;
    use serde_json::Value;

    fn doc(location: &str) -> Document {
        let mut doc = Document::new();
        doc.insert("location".into(), Value::String(location.into()));
        doc.insert("createdAt".into(), server_timestamp());
        doc
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryDocumentStore::new();
        store.put("files", "abc", doc("qr/1")).await.unwrap();

        let fetched = store.get("files", "abc").await.unwrap().unwrap();
        assert_eq!(fetched["location"], Value::String("qr/1".into()));
        assert!(fetched["createdAt"].is_string());
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_collections_are_separate() {
        let store = MemoryDocumentStore::new();
        store.put("files", "abc", doc("a")).await.unwrap();

        assert!(store.get("other", "abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store.put("files", "abc", doc("a")).await.unwrap();

        store.delete("files", "abc").await.unwrap();
        store.delete("files", "abc").await.unwrap();

        assert!(store.get("files", "abc").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }
}
