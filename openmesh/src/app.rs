//! Application state and initialization
//!
//! This module builds the catalog service from configuration and
//! prepares the local data directory when running in local mode.

use crate::config::{CatalogConfig, StorageMode};
use crate::error::Result;
use crate::services::CatalogService;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub config: CatalogConfig,
    pub catalog: CatalogService,
}

/// Application setup - called once on startup
pub async fn setup(config: CatalogConfig) -> Result<AppState> {
    tracing::info!("Initializing catalog (mode: {:?})", config.mode);

    config.validate()?;

    if config.mode == StorageMode::Local {
        tracing::info!("Data directory: {:?}", config.data_dir);
        tokio::fs::create_dir_all(&config.data_dir).await?;
    }

    let catalog = CatalogService::from_config(&config)?;

    tracing::info!("Catalog initialized successfully");

    Ok(AppState { config, catalog })
}
