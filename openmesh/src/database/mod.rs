//! Database module
//!
//! This module provides the local persistence engine:
//! - Schema provisioning and forward-only migrations
//! - Record definitions
//! - Record store for the `models` and `collections` tables
//!
//! `LocalEngine` opens its connection pool lazily on first use. Concurrent
//! first calls share a single open.

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::RecordStore;
pub use schema::{initialize_database, SCHEMA_VERSION};

use crate::error::Result;
use crate::storage::BlobStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Build connection options shared by migration and application connections.
fn connect_options(db_path: &Path) -> std::result::Result<SqliteConnectOptions, sqlx::Error> {
    SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display())).map(
        |opts| {
            opts.create_if_missing(true)
                .busy_timeout(Duration::from_secs(5))
                .journal_mode(SqliteJournalMode::Wal)
        },
    )
}

/// Create and initialize a database connection pool.
///
/// Migrations run on a dedicated single-connection pool that is closed
/// before the application pool is created, so every pooled connection
/// sees the final schema.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::info!("Creating database connection pool at: {:?}", db_path);

    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let migration_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(db_path)?)
        .await?;

    initialize_database(&migration_pool).await?;
    migration_pool.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options(db_path)?)
        .await?;

    tracing::info!("Database pool created successfully");

    Ok(pool)
}

/// Create an initialized in-memory pool.
///
/// A single connection that is never recycled keeps the database alive
/// for the lifetime of the pool.
pub async fn create_memory_pool() -> Result<SqlitePool> {
    tracing::info!("Creating in-memory database");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
        .await?;

    initialize_database(&pool).await?;

    Ok(pool)
}

#[derive(Debug)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Local persistence engine: records and blobs behind one lazily opened pool
#[derive(Clone)]
pub struct LocalEngine {
    location: Arc<Location>,
    pool: Arc<OnceCell<SqlitePool>>,
}

impl LocalEngine {
    /// Engine backed by a SQLite file. Nothing is opened until first use.
    pub fn open(db_path: impl Into<PathBuf>) -> Self {
        Self {
            location: Arc::new(Location::File(db_path.into())),
            pool: Arc::new(OnceCell::new()),
        }
    }

    /// Engine backed by a private in-memory database
    pub fn in_memory() -> Self {
        Self {
            location: Arc::new(Location::Memory),
            pool: Arc::new(OnceCell::new()),
        }
    }

    /// Connection pool, opening and migrating the database on first call
    pub async fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .get_or_try_init(|| async {
                match self.location.as_ref() {
                    Location::File(path) => create_pool(path).await,
                    Location::Memory => create_memory_pool().await,
                }
            })
            .await
    }

    pub async fn records(&self) -> Result<RecordStore> {
        Ok(RecordStore::new(self.pool().await?.clone()))
    }

    pub async fn blobs(&self) -> Result<BlobStore> {
        Ok(BlobStore::new(self.pool().await?.clone()))
    }

    /// Schema version recorded in the opened database
    pub async fn schema_version(&self) -> Result<i64> {
        schema::schema_version(self.pool().await?).await
    }

    /// Close the pool if it was opened
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }
}

impl std::fmt::Debug for LocalEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEngine")
            .field("location", &self.location)
            .field("opened", &self.pool.initialized())
            .finish()
    }
}
