use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_catalog::{
    AzureBlobStore, BlobStore, CatalogRepository, CatalogService, EmbeddingGateway,
    InMemoryBlobStore, InMemoryCatalogRepository, MongoCatalogRepository, OpenAiGateway,
    SearchService,
};
use mongodb::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod state;

use config::{BlobBackend, CatalogBackend, Config};
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output
    install_color_eyre();

    // Load configuration from environment variables
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.environment);

    let gateway: Arc<dyn EmbeddingGateway> = Arc::new(OpenAiGateway::new(config.openai.clone())?);
    info!(flavor = %config.openai.flavor, "AI provider configured");

    let blobs: Arc<dyn BlobStore> = match &config.blob_backend {
        BlobBackend::Azure(azure) => Arc::new(AzureBlobStore::new(azure.clone())?),
        BlobBackend::Memory => {
            warn!("Using in-memory blob storage, images are lost on restart");
            Arc::new(InMemoryBlobStore::new())
        }
    };

    match config.catalog_backend.clone() {
        CatalogBackend::MongoDb { mongodb, options } => {
            info!("Connecting to MongoDB at {}", mongodb.redacted_url());

            // Connect to MongoDB with retry
            let mongo_client =
                database::mongodb::connect_from_config_with_retry(&mongodb, None).await?;
            let db = mongo_client.database(mongodb.database());

            info!(
                "Successfully connected to MongoDB database: {}",
                mongodb.database()
            );

            let repository = MongoCatalogRepository::with_options(
                db,
                config.catalog.partition_key.clone(),
                options,
            );
            repository.ensure_indexes().await?;

            serve(Arc::new(repository), blobs, gateway, config, Some(mongo_client)).await
        }
        CatalogBackend::Memory => {
            warn!("Using in-memory catalog, items are lost on restart");
            let repository = Arc::new(InMemoryCatalogRepository::new());
            serve(repository, blobs, gateway, config, None).await
        }
    }
}

async fn serve<R: CatalogRepository + 'static>(
    repository: Arc<R>,
    blobs: Arc<dyn BlobStore>,
    gateway: Arc<dyn EmbeddingGateway>,
    config: Config,
    mongo_client: Option<Client>,
) -> eyre::Result<()> {
    // Initialize the application state
    let state = AppState {
        catalog: CatalogService::new(
            repository.clone(),
            blobs,
            gateway.clone(),
            config.catalog.clone(),
        ),
        search: SearchService::new(repository, gateway, config.catalog.clone()),
    };

    // Build router with API routes
    let api_routes = api::routes(&state);

    // Create a router with OpenAPI docs
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes, &config.server)?;

    // Merge health endpoints
    let app = router.merge(health_router(config.app));

    info!("Starting SnapBox API with production-ready shutdown (30s timeout)");

    // Production-ready server with graceful shutdown
    create_production_app(
        app,
        &config.server,
        Duration::from_secs(30),
        async move {
            if let Some(client) = mongo_client {
                info!("Shutting down: closing MongoDB connections");
                client.shutdown().await;
                info!("MongoDB connection closed successfully");
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("SnapBox API shutdown complete");
    Ok(())
}
