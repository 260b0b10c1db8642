//! dg-practice Service - HTTP API for the disc golf practice tracker
//!
//! This is the main entry point for the dg-practice service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dg_practice_service::{create_router, AppState, ServiceConfig};
use dg_practice_store::{JsonStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dg_practice=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dg-practice service");

    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        data_file = %config.data_file,
        input_policy = %config.input_policy,
        normalize_on_start = config.normalize_on_start,
        "Service configuration loaded"
    );

    tracing::info!(path = %config.data_file, "Opening JSON store");
    let store = Arc::new(JsonStore::open_with_legacy_owner(
        &config.data_file,
        config.legacy_owner,
    )?);

    if config.normalize_on_start {
        let report = store.normalize()?;
        tracing::info!(
            users = report.users.len(),
            discs = report.discs.len(),
            "Normalized cached stats"
        );
    }

    let state = AppState::new(store, config.clone());

    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
