//! Integration tests for the OpenMesh catalog
//!
//! These tests verify end-to-end functionality against a file-backed store:
//! - Upload and fetch round-trips
//! - Persistence across engine reopen
//! - Concurrent creates and collection appends

use openmesh::app;
use openmesh::config::{CatalogConfig, StorageMode};
use openmesh::database::{LocalEngine, ModelCategory, NewCollection, NewModel, SCHEMA_VERSION};
use openmesh::services::CatalogService;
use openmesh::storage::HandleRegistry;
use std::sync::Arc;
use tempfile::TempDir;

/// Helper to create a service over a temporary database file
fn create_test_service() -> (CatalogService, LocalEngine, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let engine = LocalEngine::open(temp_dir.path().join("openmesh.db"));
    let service = CatalogService::local(engine.clone(), Arc::new(HandleRegistry::new(64)));

    (service, engine, temp_dir)
}

fn new_model(title: &str, category: ModelCategory, tags: &[&str]) -> NewModel {
    NewModel {
        title: title.to_string(),
        description: format!("{} scanned on site", title),
        file_name: "scan.glb".to_string(),
        thumbnail: None,
        license: "CC-BY-4.0".to_string(),
        source_url: Some("https://example.com/source".to_string()),
        region: None,
        category,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_clock_tower_round_trip() {
    let (service, _engine, _temp) = create_test_service();
    let metadata = new_model("Clock Tower", ModelCategory::Monument, &["historic"]);
    let payload: Vec<u8> = (0x01..=0x0A).collect();

    let created = service
        .create_model(metadata.clone(), payload.clone())
        .await
        .unwrap();
    assert!(!created.id.is_empty());

    let fetched = service.get_model(&created.id).await.unwrap().unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.title, metadata.title);
    assert_eq!(fetched.description, metadata.description);
    assert_eq!(fetched.file_name, metadata.file_name);
    assert_eq!(fetched.thumbnail, metadata.thumbnail);
    assert_eq!(fetched.license, metadata.license);
    assert_eq!(fetched.source_url, metadata.source_url);
    assert_eq!(fetched.region, metadata.region);
    assert_eq!(fetched.category, metadata.category);
    assert_eq!(fetched.tags, metadata.tags);

    let bytes = service.resolve_handle(&fetched.file_url).unwrap();
    assert_eq!(&bytes[..], payload.as_slice());
}

#[tokio::test]
async fn test_round_trip_keeps_file_name() {
    let (service, _engine, _temp) = create_test_service();
    let metadata = NewModel {
        file_name: "scans/tower.glb".to_string(),
        ..new_model("Clock Tower", ModelCategory::Monument, &["historic"])
    };

    let created = service.create_model(metadata.clone(), vec![1, 2]).await.unwrap();
    let fetched = service.get_model(&created.id).await.unwrap().unwrap();

    assert_eq!(fetched.file_name, "scans/tower.glb");
    assert_eq!(fetched.file_name, metadata.file_name);
}

#[tokio::test]
async fn test_list_and_get_are_consistent() {
    let (service, _engine, _temp) = create_test_service();

    for (i, category) in ModelCategory::ALL.iter().enumerate() {
        service
            .create_model(new_model(&format!("Model {}", i), *category, &[]), vec![i as u8; 16])
            .await
            .unwrap();
    }

    let listed = service.list_models().await.unwrap();
    assert_eq!(listed.len(), ModelCategory::ALL.len());

    for model in &listed {
        assert_eq!(model.file_url, "");

        let fetched = service.get_model(&model.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, model.id);
        assert!(!fetched.file_url.is_empty());
    }
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("openmesh.db");

    let (model_id, collection_id) = {
        let engine = LocalEngine::open(&db_path);
        let service = CatalogService::local(engine.clone(), Arc::new(HandleRegistry::new(4)));

        let model = service
            .create_model(new_model("Lighthouse", ModelCategory::Building, &[]), b"payload".to_vec())
            .await
            .unwrap();
        let collection = service
            .create_collection(NewCollection {
                name: "Coast".to_string(),
                description: String::new(),
                model_ids: vec![model.id.clone()],
                cover_image: None,
            })
            .await
            .unwrap();

        engine.close().await;
        (model.id, collection.id)
    };

    let engine = LocalEngine::open(&db_path);
    let service = CatalogService::local(engine.clone(), Arc::new(HandleRegistry::new(4)));

    assert_eq!(engine.schema_version().await.unwrap(), SCHEMA_VERSION);

    let model = service.get_model(&model_id).await.unwrap().unwrap();
    assert_eq!(model.title, "Lighthouse");
    assert_eq!(&service.resolve_handle(&model.file_url).unwrap()[..], b"payload");

    let members = service
        .list_collection_models(&collection_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, model_id);
}

#[tokio::test]
async fn test_concurrent_creates() {
    let (service, _engine, _temp) = create_test_service();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..10u8 {
        let service = service.clone();
        tasks.spawn(async move {
            service
                .create_model(
                    new_model(&format!("Concurrent {}", i), ModelCategory::Other, &[]),
                    vec![i; 8],
                )
                .await
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    let models = service.list_models().await.unwrap();
    assert_eq!(models.len(), 10);
}

#[tokio::test]
async fn test_concurrent_appends_are_not_lost() {
    let (service, _engine, _temp) = create_test_service();

    let collection = service
        .create_collection(NewCollection {
            name: "Shared".to_string(),
            description: String::new(),
            model_ids: Vec::new(),
            cover_image: None,
        })
        .await
        .unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..20 {
        let service = service.clone();
        let collection_id = collection.id.clone();
        tasks.spawn(async move {
            service
                .add_model_to_collection(&collection_id, &format!("model-{}", i))
                .await
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert!(result.unwrap().unwrap().is_some());
    }

    let stored = service.get_collection(&collection.id).await.unwrap().unwrap();
    assert_eq!(stored.model_ids.len(), 20);
    for i in 0..20 {
        assert!(stored.model_ids.contains(&format!("model-{}", i)));
    }
}

#[tokio::test]
async fn test_handle_capacity_bounds_live_handles() {
    let temp_dir = TempDir::new().unwrap();
    let engine = LocalEngine::open(temp_dir.path().join("openmesh.db"));
    let service = CatalogService::local(engine, Arc::new(HandleRegistry::new(3)));

    let model = service
        .create_model(new_model("Statue", ModelCategory::Artifact, &[]), vec![5; 64])
        .await
        .unwrap();

    let mut urls = Vec::new();
    for _ in 0..10 {
        urls.push(service.get_model(&model.id).await.unwrap().unwrap().file_url);
    }

    assert_eq!(service.handles().live_count(), 3);
    assert!(service.resolve_handle(&urls[0]).is_none());
    assert!(service.resolve_handle(&urls[9]).is_some());
}

#[tokio::test]
async fn test_app_setup_from_config() {
    let temp_dir = TempDir::new().unwrap();
    let config = CatalogConfig {
        mode: StorageMode::Local,
        data_dir: temp_dir.path().join("data"),
        ..CatalogConfig::default()
    };

    let state = app::setup(config.clone()).await.unwrap();
    state
        .catalog
        .create_model(new_model("Tram Depot", ModelCategory::Infrastructure, &["transit"]), vec![1])
        .await
        .unwrap();

    assert!(config.db_path().exists());
    assert_eq!(state.catalog.list_models().await.unwrap().len(), 1);
}
