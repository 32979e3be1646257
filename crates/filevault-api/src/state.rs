//! Shared application state handed to every handler.

use filevault_services::{FileCatalog, FileStore, Storage, UploadCoordinator};
use std::sync::Arc;

/// HTTP-facing settings resolved from configuration at startup.
#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub is_production: bool,
    pub max_upload_size_bytes: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadCoordinator,
    pub catalog: FileCatalog,
    /// Probed by the health check
    pub store: Arc<dyn FileStore>,
    /// Probed by the health check
    pub storage: Arc<dyn Storage>,
    pub http: HttpConfig,
}
