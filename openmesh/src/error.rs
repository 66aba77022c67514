//! Error types for the OpenMesh catalog core
//!
//! All errors use thiserror for structured error handling.
//! Lookups that find nothing are not errors: they return `Ok(None)`.
//! These errors can be serialized to the UI layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the remote catalog service
    #[error("Remote service returned status {status} for {url}")]
    Remote { status: u16, url: String },

    /// Operation referenced a table outside the provisioned schema
    #[error("Schema error: unknown table '{0}'")]
    Schema(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Blob store error: {0}")]
    BlobStore(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
