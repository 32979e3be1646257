//! Test helpers: build AppState and router around in-memory services.
//!
//! Run from workspace root: `cargo test -p filevault-api`.

#![allow(dead_code)]

use axum_test::TestServer;
use filevault_api::auth::jwt::issue_token;
use filevault_api::constants::{API_PREFIX, DEFAULT_TOKEN_TTL_SECS};
use filevault_api::setup::routes;
use filevault_api::state::{AppState, HttpConfig};
use filevault_core::UploadConfig;
use filevault_services::test_helpers::{MockFileStore, MockStorage};
use filevault_services::{FileCatalog, InMemorySearchCache, MetadataWriter, UploadCoordinator};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";

/// API path prefix for tests (e.g. `/api/v0/files`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

/// Test application: server plus handles on the in-memory backends.
pub struct TestApp {
    pub server: TestServer,
    pub store: Arc<MockFileStore>,
    pub storage: Arc<MockStorage>,
    pub cache: Arc<InMemorySearchCache>,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Bearer header value for `owner_id`.
pub fn bearer(owner_id: Uuid) -> String {
    let token = issue_token(TEST_JWT_SECRET, owner_id, DEFAULT_TOKEN_TTL_SECS)
        .expect("Failed to issue test token");
    format!("Bearer {}", token)
}

/// Small chunks so multi-chunk uploads stay cheap.
pub fn test_upload_config() -> UploadConfig {
    UploadConfig {
        chunk_size_bytes: 16,
        queue_depth: 2,
        workers: 3,
        max_upload_size_bytes: 1024,
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(test_upload_config())
}

pub fn setup_test_app_with(upload: UploadConfig) -> TestApp {
    let store = Arc::new(MockFileStore::new());
    let storage = Arc::new(MockStorage::new());
    let cache = Arc::new(InMemorySearchCache::new());

    let http = HttpConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        is_production: false,
        max_upload_size_bytes: upload.max_upload_size_bytes,
    };

    let writer = MetadataWriter::new(store.clone(), storage.clone(), cache.clone());
    let state = Arc::new(AppState {
        uploads: UploadCoordinator::new(storage.clone(), writer, upload),
        catalog: FileCatalog::new(store.clone(), cache.clone(), Duration::from_secs(300)),
        store: store.clone(),
        storage: storage.clone(),
        http,
    });

    let server = TestServer::new(routes::setup_routes(state)).expect("Failed to create test server");

    TestApp {
        server,
        store,
        storage,
        cache,
    }
}
