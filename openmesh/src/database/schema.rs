//! Database schema and migrations
//!
//! This module provisions the three namespaces (models, files, collections)
//! and tracks the schema version. Migrations are forward-only and additive:
//! they create missing tables and never drop or rewrite existing ones.

use crate::error::{AppError, Result};
use sqlx::sqlite::SqlitePool;

/// Schema version the running code expects
pub const SCHEMA_VERSION: i64 = 1;

pub const MODELS_TABLE: &str = "models";
pub const FILES_TABLE: &str = "files";
pub const COLLECTIONS_TABLE: &str = "collections";

/// Every namespace the schema provisions
pub const ALL_TABLES: [&str; 3] = [MODELS_TABLE, FILES_TABLE, COLLECTIONS_TABLE];

/// Initialize the schema and apply pending migrations.
/// Returns the schema version after initialization.
pub async fn initialize_database(pool: &SqlitePool) -> Result<i64> {
    tracing::info!("Initializing database schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current_version = schema_version(pool).await?;

    tracing::info!("Current database version: {}", current_version);

    if current_version > SCHEMA_VERSION {
        return Err(AppError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current_version, SCHEMA_VERSION
        )));
    }

    apply_migrations(pool, current_version).await?;

    tracing::info!("Database initialization complete");
    Ok(SCHEMA_VERSION)
}

/// Highest applied migration version, 0 for a fresh database
pub async fn schema_version(pool: &SqlitePool) -> Result<i64> {
    let version: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
            .fetch_one(pool)
            .await?;

    Ok(version)
}

async fn apply_migrations(pool: &SqlitePool, current_version: i64) -> Result<()> {
    for (version, sql) in get_migrations() {
        if version <= current_version {
            continue;
        }

        tracing::info!("Applying migration version {}", version);

        let mut tx = pool.begin().await?;

        for statement in sql.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        sqlx::query("INSERT INTO schema_migrations (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Migration version {} applied successfully", version);
    }

    Ok(())
}

fn get_migrations() -> Vec<(i64, &'static str)> {
    vec![(1, include_str!("migrations/001_initial_schema.sql"))]
}
