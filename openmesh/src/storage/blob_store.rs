//! Blob storage
//!
//! Stores raw model payloads in the `files` namespace, keyed by the id of the
//! owning model (one blob per model). Each row carries the payload size and a
//! SHA-256 digest that is verified on every read.

use crate::error::{AppError, Result};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

/// Blob store keyed by model id
#[derive(Clone)]
pub struct BlobStore {
    pool: SqlitePool,
}

impl BlobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Write a payload, replacing any previous payload for the id
    pub async fn put(&self, id: &str, data: &[u8]) -> Result<()> {
        let hash = calculate_hash(data);

        sqlx::query(
            r#"
            INSERT INTO files (id, data, size, sha256) VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                data = excluded.data,
                size = excluded.size,
                sha256 = excluded.sha256
            "#,
        )
        .bind(id)
        .bind(data)
        .bind(data.len() as i64)
        .bind(&hash)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Wrote blob: {} ({} bytes)", id, data.len());

        Ok(())
    }

    /// Read a payload. `None` means no payload was ever attached.
    pub async fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>, String)> =
            sqlx::query_as("SELECT data, sha256 FROM files WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((data, expected)) = row else {
            return Ok(None);
        };

        if calculate_hash(&data) != expected {
            return Err(AppError::BlobStore(format!("checksum mismatch for blob {}", id)));
        }

        tracing::debug!("Read blob: {} ({} bytes)", id, data.len());

        Ok(Some(data))
    }
}

/// Hex-encoded SHA-256 of a payload
fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::initialize_database;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn create_test_store() -> BlobStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();

        BlobStore::new(pool)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = create_test_store().await;

        let data = b"glTF binary payload";
        store.put("model-1", data).await.unwrap();

        let read = store.get("model-1").await.unwrap().unwrap();
        assert_eq!(read, data);
    }

    #[tokio::test]
    async fn test_missing_blob_is_none() {
        let store = create_test_store().await;

        assert!(store.get("never-written").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_payload() {
        let store = create_test_store().await;

        store.put("model-1", b"first version, longer").await.unwrap();
        store.put("model-1", b"second").await.unwrap();

        let read = store.get("model-1").await.unwrap().unwrap();
        assert_eq!(read, b"second");
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let store = create_test_store().await;

        store.put("empty", b"").await.unwrap();

        let read = store.get("empty").await.unwrap().unwrap();
        assert!(read.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_blob_is_rejected() {
        let store = create_test_store().await;
        store.put("model-1", b"original").await.unwrap();

        sqlx::query("UPDATE files SET data = ? WHERE id = ?")
            .bind(&b"tampered"[..])
            .bind("model-1")
            .execute(&store.pool)
            .await
            .unwrap();

        let result = store.get("model-1").await;
        assert!(matches!(result, Err(AppError::BlobStore(_))));
    }

    #[test]
    fn test_hash_consistency() {
        assert_eq!(calculate_hash(b"Test data"), calculate_hash(b"Test data"));
        assert_ne!(calculate_hash(b"Test data"), calculate_hash(b"Other data"));
        assert_eq!(calculate_hash(b"").len(), 64);
    }
}
