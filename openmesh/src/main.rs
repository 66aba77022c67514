// OpenMesh - 3D asset catalog
// Command-line entry point for inspecting a catalog

use anyhow::{bail, Context};
use openmesh::app;
use openmesh::config::CatalogConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: openmesh <list-models | list-collections | get-model <id> | get-collection <id>>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "openmesh=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting OpenMesh catalog");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = CatalogConfig::from_env().context("failed to read configuration")?;
    let state = app::setup(config).await.context("failed to initialize catalog")?;
    let catalog = &state.catalog;

    let output = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["list-models"] => serde_json::to_string_pretty(&catalog.list_models().await?)?,
        ["list-collections"] => serde_json::to_string_pretty(&catalog.list_collections().await?)?,
        ["get-model", id] => match catalog.get_model(id).await? {
            Some(model) => serde_json::to_string_pretty(&model)?,
            None => bail!("model not found: {}", id),
        },
        ["get-collection", id] => match catalog.get_collection(id).await? {
            Some(collection) => serde_json::to_string_pretty(&collection)?,
            None => bail!("collection not found: {}", id),
        },
        _ => bail!(USAGE),
    };

    println!("{}", output);
    Ok(())
}
