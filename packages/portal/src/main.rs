use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::PermissionCatalog;
use tracing::{Level, info};

use portal::config::AppConfig;
use portal::database::init_db;
use portal::notify::LogNotifier;
use portal::seed;
use portal::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let catalog = PermissionCatalog::standard().context("invalid permission catalog")?;

    let db = init_db(&config.database.url)
        .await
        .context("failed to connect to database")?;
    seed::ensure_indexes(&db).await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid server address")?;

    let state = AppState {
        db,
        config,
        catalog: Arc::new(catalog),
        notifier: Arc::new(LogNotifier),
    };
    let app = portal::build_router(state);

    info!("Server running at http://{}", addr);
    info!("API reference at http://{}/scalar", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
