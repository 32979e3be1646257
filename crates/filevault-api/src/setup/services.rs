//! Wiring of repositories, cache and services

use crate::state::{AppState, HttpConfig};
use filevault_core::Config;
use filevault_services::{
    ExpiredFileReaper, FileCatalog, FileRepository, FileStore, InMemorySearchCache,
    MetadataWriter, SearchCache, Storage, UploadCoordinator,
};
use sqlx::PgPool;
use std::sync::Arc;

pub struct Services {
    pub state: Arc<AppState>,
    pub reaper: Arc<ExpiredFileReaper>,
}

pub fn initialize_services(config: &Config, pool: PgPool, storage: Arc<dyn Storage>) -> Services {
    let store: Arc<dyn FileStore> = Arc::new(FileRepository::new(pool));
    let cache: Arc<dyn SearchCache> = Arc::new(InMemorySearchCache::new());
    tracing::info!(
        ttl_secs = config.search_cache_ttl().as_secs(),
        "Search cache initialized (in-process)"
    );

    let upload = config.upload().clone();
    tracing::info!(
        chunk_size_bytes = upload.chunk_size_bytes,
        queue_depth = upload.queue_depth,
        workers = upload.workers,
        max_upload_size_bytes = upload.max_upload_size_bytes,
        "Upload pipeline configured"
    );

    let http = HttpConfig {
        jwt_secret: config.jwt_secret().to_string(),
        cors_origins: config.cors_origins().to_vec(),
        is_production: config.is_production(),
        max_upload_size_bytes: upload.max_upload_size_bytes,
    };

    let writer = MetadataWriter::new(store.clone(), storage.clone(), cache.clone());
    let uploads = UploadCoordinator::new(storage.clone(), writer, upload);
    let catalog = FileCatalog::new(store.clone(), cache.clone(), config.search_cache_ttl());
    let reaper = Arc::new(ExpiredFileReaper::new(
        store.clone(),
        storage.clone(),
        cache,
        config.file_retention_days(),
        config.cleanup_interval(),
    ));

    Services {
        state: Arc::new(AppState {
            uploads,
            catalog,
            store,
            storage,
            http,
        }),
        reaper,
    }
}
