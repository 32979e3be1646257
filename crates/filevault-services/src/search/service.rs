use std::sync::Arc;
use std::time::Duration;

use filevault_core::{AppError, FileRecord, RenameFileRequest, SearchParams};
use filevault_db::{FileStore, SearchPredicate};
use uuid::Uuid;
use validator::Validate;

use super::cache::SearchCache;
use super::fingerprint::{invalidate_owner, search_cache_key};

/// Read and rename operations over an owner's file metadata.
///
/// Searches are served from the cache when possible. Any mutation drops the
/// mutated owner's cached searches, and only those.
#[derive(Clone)]
pub struct FileCatalog {
    store: Arc<dyn FileStore>,
    cache: Arc<dyn SearchCache>,
    cache_ttl: Duration,
}

impl FileCatalog {
    pub fn new(store: Arc<dyn FileStore>, cache: Arc<dyn SearchCache>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
        }
    }

    /// Search the owner's files and return the serialized JSON array.
    ///
    /// A hit returns the cached payload unchanged. Cache failures never fail
    /// the search; the store answers instead and the result is not cached.
    #[tracing::instrument(skip(self, params), fields(owner_id = %owner_id))]
    pub async fn search(&self, owner_id: Uuid, params: &SearchParams) -> Result<String, AppError> {
        let key = search_cache_key(owner_id, params);

        match self.cache.get(&key).await {
            Ok(Some(payload)) => {
                tracing::debug!(cache_key = %key, "Search cache hit");
                return Ok(payload);
            }
            Ok(None) => tracing::debug!(cache_key = %key, "Search cache miss"),
            Err(e) => tracing::warn!(error = %e, "Search cache read failed, querying store"),
        }

        let predicate = SearchPredicate::from_params(owner_id, params);
        let files = self.store.query(&predicate).await?;
        let payload = serde_json::to_string(&files)
            .map_err(|e| AppError::Internal(format!("Failed to serialize search results: {}", e)))?;

        if let Err(e) = self.cache.set(&key, payload.clone(), self.cache_ttl).await {
            tracing::warn!(error = %e, "Search cache write failed");
        }

        Ok(payload)
    }

    /// Every file of the owner, newest first. Not cached.
    pub async fn list_files(&self, owner_id: Uuid) -> Result<Vec<FileRecord>, AppError> {
        self.store.query(&SearchPredicate::for_owner(owner_id)).await
    }

    pub async fn get_file(&self, owner_id: Uuid, id: Uuid) -> Result<FileRecord, AppError> {
        self.store
            .get(owner_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))
    }

    #[tracing::instrument(skip(self, request), fields(owner_id = %owner_id, file_id = %id))]
    pub async fn rename_file(
        &self,
        owner_id: Uuid,
        id: Uuid,
        request: RenameFileRequest,
    ) -> Result<FileRecord, AppError> {
        request.validate()?;
        let name = request.name.trim();

        let file = self
            .store
            .update_file_name(owner_id, id, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))?;

        invalidate_owner(self.cache.as_ref(), owner_id).await;
        tracing::info!("File renamed");

        Ok(file)
    }
}
