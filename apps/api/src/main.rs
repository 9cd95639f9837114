mod config;
mod db;
mod errors;
mod forms;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, init_schema};
use crate::forms::artifacts::DiskArtifactStore;
use crate::forms::secret::SecretHasher;
use crate::forms::store::PgFormStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting forms API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    init_schema(&pool).await?;

    // Initialize the upload directory
    let artifacts = DiskArtifactStore::new(&config.upload_dir)
        .await
        .map_err(|e| anyhow::anyhow!("upload dir init failed: {e}"))?;
    info!("Upload directory ready at {}", config.upload_dir);

    let state = AppState {
        forms: Arc::new(PgFormStore::new(pool)),
        artifacts: Arc::new(artifacts),
        hasher: Arc::new(SecretHasher::new(config.hash_iterations)),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // the original API is fully open

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
