//! Catalog configuration
//!
//! Central location for configuration constants and the runtime
//! `CatalogConfig` that selects the storage backend once per process.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;

// ===== Local Store =====

/// File name of the SQLite database inside the data directory
pub const DB_FILE_NAME: &str = "openmesh.db";

/// Default data directory when none is configured
pub const DEFAULT_DATA_DIR: &str = "openmesh-data";

// ===== Remote Service =====

/// Base URL of the reference catalog service
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

/// User agent sent with every remote request
pub const USER_AGENT: &str = concat!("OpenMesh/", env!("CARGO_PKG_VERSION"));

// ===== Blob Handles =====

/// Prefix of every handle URL issued by the handle registry
pub const HANDLE_SCHEME: &str = "blob:openmesh/";

/// Default number of live blob handles before the oldest is evicted
pub const DEFAULT_HANDLE_CAPACITY: usize = 64;

// ===== Environment Variables =====

pub const ENV_MODE: &str = "OPENMESH_MODE";
pub const ENV_DATA_DIR: &str = "OPENMESH_DATA_DIR";
pub const ENV_API_URL: &str = "OPENMESH_API_URL";
pub const ENV_HANDLE_CAPACITY: &str = "OPENMESH_HANDLE_CAPACITY";

/// Which backend serves every catalog operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Embedded SQLite store, no network calls
    #[default]
    Local,
    /// HTTP calls against the remote catalog service
    Remote,
}

impl FromStr for StorageMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(AppError::Config(format!("unknown storage mode: {}", other))),
        }
    }
}

/// Runtime configuration, fixed for the lifetime of a `CatalogService`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub mode: StorageMode,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_handle_capacity")]
    pub handle_capacity: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_handle_capacity() -> usize {
    DEFAULT_HANDLE_CAPACITY
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            data_dir: default_data_dir(),
            api_url: default_api_url(),
            handle_capacity: default_handle_capacity(),
        }
    }
}

impl CatalogConfig {
    /// Path of the SQLite database used in local mode
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    /// Load configuration from a JSON file.
    /// A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;

        tracing::info!("Loaded config from {:?} (mode: {:?})", path, config.mode);
        Ok(config)
    }

    /// Build configuration from `OPENMESH_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup(ENV_MODE) {
            config.mode = mode.parse()?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup(ENV_API_URL) {
            config.api_url = url;
        }
        if let Some(capacity) = lookup(ENV_HANDLE_CAPACITY) {
            config.handle_capacity = capacity.trim().parse().map_err(|_| {
                AppError::Config(format!("invalid {}: {}", ENV_HANDLE_CAPACITY, capacity))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the catalog cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.handle_capacity == 0 {
            return Err(AppError::Config(
                "handle_capacity must be at least 1".to_string(),
            ));
        }

        if self.mode == StorageMode::Remote && self.api_url.trim().is_empty() {
            return Err(AppError::Config(
                "api_url is required in remote mode".to_string(),
            ));
        }

        Ok(())
    }
}
