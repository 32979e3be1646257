use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use filevault_core::{AppError, FileRecord};
use filevault_db::FileStore;
use filevault_storage::keys::chunk_key;
use filevault_storage::Storage;
use tokio::time::interval;

use crate::search::{invalidate_owner, SearchCache};

/// Outcome of one reaper pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapSummary {
    pub scanned: usize,
    pub deleted: usize,
    /// Files kept for the next pass because a chunk or row delete failed
    pub failed: usize,
}

/// Deletes files older than the retention period, chunks first, then the record.
#[derive(Clone)]
pub struct ExpiredFileReaper {
    store: Arc<dyn FileStore>,
    storage: Arc<dyn Storage>,
    cache: Arc<dyn SearchCache>,
    retention_days: i64,
    run_interval: Duration,
}

impl ExpiredFileReaper {
    pub fn new(
        store: Arc<dyn FileStore>,
        storage: Arc<dyn Storage>,
        cache: Arc<dyn SearchCache>,
        retention_days: i64,
        run_interval: Duration,
    ) -> Self {
        Self {
            store,
            storage,
            cache,
            retention_days,
            run_interval,
        }
    }

    /// Start the background reaper loop.
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reap_interval = interval(self.run_interval);

            loop {
                reap_interval.tick().await;

                tracing::info!(
                    retention_days = self.retention_days,
                    "Starting scheduled cleanup of expired files"
                );

                match self.run_once().await {
                    Ok(summary) => tracing::info!(
                        scanned = summary.scanned,
                        deleted = summary.deleted,
                        failed = summary.failed,
                        "Cleanup task completed"
                    ),
                    Err(e) => tracing::error!(error = %e, "Cleanup task failed"),
                }
            }
        })
    }

    #[tracing::instrument(skip(self), fields(cleanup.operation = "expire_files"))]
    pub async fn run_once(&self) -> Result<ReapSummary, AppError> {
        let cutoff = Utc::now() - chrono::Duration::days(self.retention_days);
        let expired = self.store.list_expired(cutoff).await?;

        let mut summary = ReapSummary {
            scanned: expired.len(),
            ..ReapSummary::default()
        };
        let mut touched_owners = HashSet::new();

        for file in expired {
            tracing::info!(
                file_id = %file.id,
                storage_key = %file.storage_key,
                upload_date = %file.upload_date,
                "Deleting expired file"
            );

            if !self.delete_chunks(&file).await {
                summary.failed += 1;
                continue;
            }

            match self.store.delete(file.id).await {
                Ok(_) => {
                    summary.deleted += 1;
                    touched_owners.insert(file.owner_id);
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        file_id = %file.id,
                        "Failed to delete expired file record"
                    );
                    summary.failed += 1;
                }
            }
        }

        for owner_id in touched_owners {
            invalidate_owner(self.cache.as_ref(), owner_id).await;
        }

        Ok(summary)
    }

    /// Attempts every chunk even after a failure; true when all are gone.
    async fn delete_chunks(&self, file: &FileRecord) -> bool {
        let mut all_deleted = true;
        for index in 0..u64::try_from(file.chunk_count).unwrap_or(0) {
            let key = chunk_key(&file.storage_key, index);
            if let Err(e) = self.storage.delete(&key).await {
                tracing::error!(
                    error = %e,
                    file_id = %file.id,
                    storage_key = %key,
                    "Failed to delete chunk, keeping record for next run"
                );
                all_deleted = false;
            }
        }
        all_deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::search_cache_key;
    use crate::test_helpers::{sample_record, MockFileStore, MockStorage};
    use crate::InMemorySearchCache;
    use bytes::Bytes;
    use filevault_core::SearchParams;
    use uuid::Uuid;

    struct Harness {
        store: Arc<MockFileStore>,
        storage: Arc<MockStorage>,
        cache: Arc<InMemorySearchCache>,
        reaper: ExpiredFileReaper,
    }

    fn harness() -> Harness {
        let store = Arc::new(MockFileStore::new());
        let storage = Arc::new(MockStorage::new());
        let cache = Arc::new(InMemorySearchCache::new());
        let reaper = ExpiredFileReaper::new(
            store.clone(),
            storage.clone(),
            cache.clone(),
            3,
            Duration::from_secs(3600),
        );
        Harness {
            store,
            storage,
            cache,
            reaper,
        }
    }

    /// Seeds a record with `chunks` stored chunk objects, uploaded `age_days` ago.
    fn seed_file(h: &Harness, owner: Uuid, age_days: i64, chunks: i32) -> FileRecord {
        let mut file = sample_record(owner, "old.bin");
        file.upload_date = Utc::now() - chrono::Duration::days(age_days);
        file.chunk_count = chunks;
        for index in 0..chunks as u64 {
            h.storage
                .seed(&chunk_key(&file.storage_key, index), Bytes::from_static(b"x"));
        }
        h.store.seed(file.clone());
        file
    }

    #[tokio::test]
    async fn removes_only_files_past_retention() {
        let h = harness();
        let owner = Uuid::new_v4();
        let old = seed_file(&h, owner, 4, 3);
        let fresh = seed_file(&h, owner, 1, 2);

        let summary = h.reaper.run_once().await.unwrap();

        assert_eq!(
            summary,
            ReapSummary {
                scanned: 1,
                deleted: 1,
                failed: 0
            }
        );
        assert_eq!(h.store.ids(), vec![fresh.id]);
        assert_eq!(h.storage.object_count(), 2);
        assert!(!h.storage.contains(&chunk_key(&old.storage_key, 0)));
    }

    #[tokio::test]
    async fn chunk_delete_failure_keeps_the_record() {
        let h = harness();
        let file = seed_file(&h, Uuid::new_v4(), 10, 2);
        h.storage.fail_deletes(true);

        let summary = h.reaper.run_once().await.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.deleted, 0);
        assert_eq!(h.store.ids(), vec![file.id]);

        // The next pass retries it.
        h.storage.fail_deletes(false);
        let summary = h.reaper.run_once().await.unwrap();
        assert_eq!(summary.deleted, 1);
        assert!(h.store.is_empty());
        assert_eq!(h.storage.object_count(), 0);
    }

    #[tokio::test]
    async fn reaping_invalidates_owner_searches() {
        let h = harness();
        let owner = Uuid::new_v4();
        let bystander = Uuid::new_v4();
        seed_file(&h, owner, 5, 1);

        let ttl = Duration::from_secs(60);
        let owner_key = search_cache_key(owner, &SearchParams::default());
        let bystander_key = search_cache_key(bystander, &SearchParams::default());
        h.cache.set(&owner_key, "[{}]".into(), ttl).await.unwrap();
        h.cache.set(&bystander_key, "[]".into(), ttl).await.unwrap();

        h.reaper.run_once().await.unwrap();

        assert_eq!(h.cache.get(&owner_key).await.unwrap(), None);
        assert!(h.cache.get(&bystander_key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn nothing_expired_is_a_no_op() {
        let h = harness();
        seed_file(&h, Uuid::new_v4(), 0, 1);

        let summary = h.reaper.run_once().await.unwrap();

        assert_eq!(summary, ReapSummary::default());
        assert_eq!(h.store.len(), 1);
    }
}
