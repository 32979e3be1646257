//! Route configuration and setup

use crate::auth::{auth_middleware, AuthState};
use crate::constants::{API_PREFIX, HTTP_CONCURRENCY_LIMIT, MULTIPART_OVERHEAD_BYTES};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>) -> Router {
    let cors = setup_cors(&state.http.cors_origins);
    let auth_state = Arc::new(AuthState::new(&state.http.jwt_secret));

    // Uploads past the configured maximum are cut off by the chunk reader with a
    // 413; the transport limit only needs to leave room for multipart framing.
    let body_limit = state
        .http
        .max_upload_size_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    let protected_routes = protected_routes()
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    public_routes()
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(ConcurrencyLimitLayer::new(HTTP_CONCURRENCY_LIMIT))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(handlers::health::health_check))
}

/// Protected routes (require a bearer token)
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/files", API_PREFIX),
            get(handlers::files::list_files).post(handlers::files::upload_file),
        )
        .route(
            &format!("{}/files/{{id}}", API_PREFIX),
            get(handlers::files::get_file).patch(handlers::files::rename_file),
        )
        .route(
            &format!("{}/search", API_PREFIX),
            get(handlers::search::search_files),
        )
}

/// Setup CORS configuration
fn setup_cors(origins: &[String]) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PATCH, Method::OPTIONS];

    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any)
}
