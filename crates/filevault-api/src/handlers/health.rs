//! Health check handler and response type.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Object probed for storage reachability; it need not exist.
const STORAGE_PROBE_KEY: &str = "health/probe";

/// Run an async check with timeout; returns status string "healthy", "timeout", or "{prefix}: {error}".
async fn run_check<F, T, E>(f: F, error_prefix: &str) -> String
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(CHECK_TIMEOUT, f).await {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => format!("{}: {}", error_prefix, e),
        Err(_) => "timeout".to_string(),
    }
}

#[derive(Debug, serde::Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (database, storage) = tokio::join!(
        run_check(state.store.ping(), "unhealthy"),
        run_check(state.storage.exists(STORAGE_PROBE_KEY), "unhealthy"),
    );

    let healthy = database == "healthy" && storage == "healthy";
    if !healthy {
        tracing::warn!(database = %database, storage = %storage, "Health check failed");
    }

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(HealthCheckResponse {
            status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
            database,
            storage,
        }),
    )
}
