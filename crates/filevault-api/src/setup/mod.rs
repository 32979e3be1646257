//! Application setup and initialization
//!
//! Everything `main` needs to turn a `Config` into a running router, split
//! by concern so tests can assemble the router around in-memory services.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use filevault_core::Config;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Running application: shared state, router and background tasks.
pub struct App {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    /// `None` when retention is disabled
    pub reaper: Option<JoinHandle<()>>,
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<App> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.is_production())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let storage = storage::setup_storage(&config).await?;
    let services = services::initialize_services(&config, pool, storage);

    let reaper = if config.file_retention_days() > 0 {
        tracing::info!(
            retention_days = config.file_retention_days(),
            interval_secs = config.cleanup_interval().as_secs(),
            "Expired file reaper started"
        );
        Some(services.reaper.clone().start())
    } else {
        tracing::info!("FILE_RETENTION_DAYS is 0, expired file reaper disabled");
        None
    };

    let router = routes::setup_routes(services.state.clone());

    Ok(App {
        state: services.state,
        router,
        reaper,
    })
}
