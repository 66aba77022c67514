//! Catalog service
//!
//! The single entry point for catalog persistence. Every operation is
//! dispatched to either the local engine or the remote gateway, chosen once
//! when the service is built.
//!
//! In local mode the service also generates identifiers and materializes
//! payload handles. Only `get_model` materializes: listings return the
//! stored `file_url` untouched, so list views should render `thumbnail`.

use crate::config::{CatalogConfig, StorageMode};
use crate::database::schema::{COLLECTIONS_TABLE, MODELS_TABLE};
use crate::database::{Collection, LocalEngine, Model, ModelFilter, NewCollection, NewModel};
use crate::error::Result;
use crate::remote::RemoteGateway;
use crate::storage::HandleRegistry;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
enum Backend {
    Local(LocalEngine),
    Remote(RemoteGateway),
}

/// Service for catalog models and collections
#[derive(Clone)]
pub struct CatalogService {
    backend: Backend,
    handles: Arc<HandleRegistry>,
}

impl CatalogService {
    pub fn local(engine: LocalEngine, handles: Arc<HandleRegistry>) -> Self {
        Self {
            backend: Backend::Local(engine),
            handles,
        }
    }

    pub fn remote(gateway: RemoteGateway, handles: Arc<HandleRegistry>) -> Self {
        Self {
            backend: Backend::Remote(gateway),
            handles,
        }
    }

    /// Build the service for the backend selected in `config`
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        config.validate()?;

        let handles = Arc::new(HandleRegistry::new(config.handle_capacity));

        let service = match config.mode {
            StorageMode::Local => Self::local(LocalEngine::open(config.db_path()), handles),
            StorageMode::Remote => Self::remote(RemoteGateway::new(&config.api_url)?, handles),
        };

        tracing::info!("Catalog service ready (mode: {:?})", service.mode());
        Ok(service)
    }

    pub fn mode(&self) -> StorageMode {
        match self.backend {
            Backend::Local(_) => StorageMode::Local,
            Backend::Remote(_) => StorageMode::Remote,
        }
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    /// List all models. Payload references are returned as stored.
    pub async fn list_models(&self) -> Result<Vec<Model>> {
        match &self.backend {
            Backend::Local(engine) => engine.records().await?.get_all(MODELS_TABLE).await,
            Backend::Remote(gateway) => gateway.list_models().await,
        }
    }

    /// Get a model by ID.
    ///
    /// In local mode an attached payload is exposed through a freshly
    /// issued handle written into `file_url`.
    pub async fn get_model(&self, id: &str) -> Result<Option<Model>> {
        let engine = match &self.backend {
            Backend::Local(engine) => engine,
            Backend::Remote(gateway) => return gateway.get_model(id).await,
        };

        let Some(mut model) = engine
            .records()
            .await?
            .get_by_id::<Model>(MODELS_TABLE, id)
            .await?
        else {
            return Ok(None);
        };

        if let Some(data) = engine.blobs().await?.get(id).await? {
            let handle = self.handles.issue(data);
            tracing::debug!("Model {} payload exposed ({} bytes)", id, handle.size());
            model.file_url = handle.url().to_string();
        }

        Ok(Some(model))
    }

    /// Create a model from metadata and its raw payload
    pub async fn create_model(&self, metadata: NewModel, data: Vec<u8>) -> Result<Model> {
        tracing::info!(
            "Creating model: {} ({} bytes)",
            metadata.title,
            data.len()
        );

        let engine = match &self.backend {
            Backend::Local(engine) => engine,
            Backend::Remote(gateway) => return gateway.create_model(&metadata, data).await,
        };

        let id = generate_id();
        let file_name = metadata.file_name.clone();

        engine.blobs().await?.put(&id, &data).await?;

        let model = Model::from_new(id, metadata, file_name, now_millis());
        engine.records().await?.put(MODELS_TABLE, &model).await?;

        tracing::info!("Model created successfully: {}", model.id);

        Ok(model)
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>> {
        match &self.backend {
            Backend::Local(engine) => engine.records().await?.get_all(COLLECTIONS_TABLE).await,
            Backend::Remote(gateway) => gateway.list_collections().await,
        }
    }

    pub async fn get_collection(&self, id: &str) -> Result<Option<Collection>> {
        match &self.backend {
            Backend::Local(engine) => {
                engine
                    .records()
                    .await?
                    .get_by_id(COLLECTIONS_TABLE, id)
                    .await
            }
            Backend::Remote(gateway) => gateway.get_collection(id).await,
        }
    }

    /// Create a collection. Member ids are stored without checking them.
    pub async fn create_collection(&self, new: NewCollection) -> Result<Collection> {
        tracing::info!("Creating collection: {}", new.name);

        let engine = match &self.backend {
            Backend::Local(engine) => engine,
            Backend::Remote(gateway) => return gateway.create_collection(&new).await,
        };

        let collection = Collection::from_new(generate_id(), new, now_millis());
        engine
            .records()
            .await?
            .put(COLLECTIONS_TABLE, &collection)
            .await?;

        tracing::info!("Collection created successfully: {}", collection.id);

        Ok(collection)
    }

    /// Atomically append a model to a collection.
    /// Returns `None` if the collection does not exist.
    pub async fn add_model_to_collection(
        &self,
        collection_id: &str,
        model_id: &str,
    ) -> Result<Option<Collection>> {
        tracing::debug!("Adding model {} to collection {}", model_id, collection_id);

        match &self.backend {
            Backend::Local(engine) => {
                engine
                    .records()
                    .await?
                    .append_model_id(collection_id, model_id)
                    .await
            }
            Backend::Remote(gateway) => gateway.append_model_id(collection_id, model_id).await,
        }
    }

    /// Models matching a search string and optional category
    pub async fn search_models(&self, filter: &ModelFilter) -> Result<Vec<Model>> {
        let models = self.list_models().await?;
        let matches = filter.matcher();

        Ok(models.into_iter().filter(|model| matches(model)).collect())
    }

    /// Models that belong to a collection, in listing order.
    /// Member ids with no matching model are skipped.
    pub async fn list_collection_models(&self, collection_id: &str) -> Result<Option<Vec<Model>>> {
        let Some(collection) = self.get_collection(collection_id).await? else {
            return Ok(None);
        };

        if collection.model_ids.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let models = self
            .list_models()
            .await?
            .into_iter()
            .filter(|model| collection.model_ids.contains(&model.id))
            .collect();

        Ok(Some(models))
    }

    /// Bytes behind a handle previously returned in `file_url`
    pub fn resolve_handle(&self, url: &str) -> Option<Arc<[u8]>> {
        self.handles.resolve(url)
    }

    /// Release a handle once it is no longer displayed
    pub fn release_handle(&self, url: &str) -> bool {
        self.handles.release(url)
    }
}

/// Time-ordered random identifier
fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
