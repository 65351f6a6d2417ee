//! SQLite-backed document store
//!
//! Documents are kept as JSON text in a single `documents` table keyed by
//! `(collection, id)`. Writes are single-statement upserts.

use crate::error::{StoreError, StoreResult};
use crate::storage::document_store::{resolve_server_timestamps, Document, DocumentStore};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::SqlitePool;

/// Document store over a SQLite connection pool
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: &str) -> StoreResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn put(&self, collection: &str, id: &str, mut document: Document) -> StoreResult<()> {
        let now = Utc::now();
        resolve_server_timestamps(&mut document, now);
        let body = serde_json::to_string(&document)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(collection, id) DO UPDATE SET
                body = excluded.body,
                created_at = excluded.created_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&body)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Wrote document {}/{} ({} bytes)", collection, id, body.len());
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(body) = body else {
            return Ok(None);
        };

        match serde_json::from_str::<Value>(&body)? {
            Value::Object(document) => Ok(Some(document)),
            _ => Err(StoreError::Corrupt {
                collection: collection.to_string(),
                id: id.to_string(),
                reason: "body is not a JSON object".to_string(),
            }),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let rows = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!("Deleted document {}/{} ({} rows)", collection, id, rows);
        Ok(())
    }
}
