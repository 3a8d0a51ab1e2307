use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::storage::{FilesystemAssetStore, StagingArea};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shelf::assets::AssetService;
use shelf::assets::repository::SeaOrmAssetRepository;
use shelf::config::AppConfig;
use shelf::database::{ensure_indexes, init_db};
use shelf::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    ensure_indexes(&db).await?;

    let store = FilesystemAssetStore::new(config.storage.upload_dir.clone())
        .await
        .context("Failed to open upload directory")?;
    let staging = StagingArea::new(
        config.storage.staging_dir.clone(),
        config.storage.max_upload_size,
    )
    .await
    .context("Failed to open staging directory")?;

    match staging
        .purge_stale(Duration::from_secs(config.storage.staging_max_age_secs))
        .await
    {
        Ok(0) => {}
        Ok(removed) => info!(removed, "Removed stale staged uploads"),
        Err(e) => warn!("Failed to purge staging directory: {e}"),
    }

    let assets = AssetService::new(
        Arc::new(store),
        Arc::new(SeaOrmAssetRepository::new(db)),
        staging,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        config,
        assets: Arc::new(assets),
    };
    let app = shelf::build_router(state);

    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
