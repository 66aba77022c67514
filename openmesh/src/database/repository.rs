//! Record store
//!
//! Keyed JSON documents grouped into record tables (`models`, `collections`).
//! Writes are upserts by id; a replaced record keeps its position in
//! insertion order.

use super::models::{Collection, Record};
use super::schema::{COLLECTIONS_TABLE, MODELS_TABLE};
use crate::error::{AppError, Result};
use sqlx::SqlitePool;

/// Tables that hold records. Blobs live in their own namespace.
pub const RECORD_TABLES: [&str; 2] = [MODELS_TABLE, COLLECTIONS_TABLE];

/// Store for structured records
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or fully replace a record by its id
    pub async fn put<R: Record>(&self, table: &str, record: &R) -> Result<()> {
        let table = resolve_table(table)?;
        let body = serde_json::to_string(record)?;

        let sql = format!(
            "INSERT INTO {table} (id, body) VALUES (?, ?) \
             ON CONFLICT(id) DO UPDATE SET body = excluded.body"
        );

        sqlx::query(&sql)
            .bind(record.id())
            .bind(&body)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Stored record {} in {}", record.id(), table);
        Ok(())
    }

    /// All records in a table, in insertion order
    pub async fn get_all<R: Record>(&self, table: &str) -> Result<Vec<R>> {
        let table = resolve_table(table)?;
        let sql = format!("SELECT body FROM {table} ORDER BY rowid");

        let bodies: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&self.pool).await?;

        let records = bodies
            .iter()
            .map(|body| serde_json::from_str(body))
            .collect::<std::result::Result<Vec<R>, _>>()?;

        Ok(records)
    }

    /// Look up a record by id
    pub async fn get_by_id<R: Record>(&self, table: &str, id: &str) -> Result<Option<R>> {
        let table = resolve_table(table)?;
        let sql = format!("SELECT body FROM {table} WHERE id = ?");

        let body: Option<String> = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        body.map(|body| serde_json::from_str(&body))
            .transpose()
            .map_err(AppError::from)
    }

    /// Append a model id to a collection's membership list.
    ///
    /// The read and the write happen in a single statement, so concurrent
    /// appends to the same collection never overwrite each other.
    /// Returns `None` if the collection does not exist.
    pub async fn append_model_id(
        &self,
        collection_id: &str,
        model_id: &str,
    ) -> Result<Option<Collection>> {
        let body: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE collections
            SET body = json_set(body, '$.modelIds[#]', ?)
            WHERE id = ?
            RETURNING body
            "#,
        )
        .bind(model_id)
        .bind(collection_id)
        .fetch_optional(&self.pool)
        .await?;

        if body.is_some() {
            tracing::debug!("Appended model {} to collection {}", model_id, collection_id);
        }

        body.map(|body| serde_json::from_str(&body))
            .transpose()
            .map_err(AppError::from)
    }
}

/// Map a caller-supplied table name onto a known record table.
/// The returned name is safe to interpolate into SQL.
fn resolve_table(table: &str) -> Result<&'static str> {
    RECORD_TABLES
        .iter()
        .copied()
        .find(|known| *known == table)
        .ok_or_else(|| AppError::Schema(table.to_string()))
}
