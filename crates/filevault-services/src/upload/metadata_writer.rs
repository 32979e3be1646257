use std::sync::Arc;

use filevault_core::{AppError, FileRecord, NewFileRecord, UploadSession, UploadStatus};
use filevault_db::FileStore;
use filevault_storage::Storage;
use uuid::Uuid;

use crate::search::{invalidate_owner, SearchCache};

/// Proof that an upload session reached `Committed`.
///
/// Only the upload coordinator can build one, so metadata is never written
/// for an aborted or unfinished session.
#[derive(Debug, Clone)]
pub struct CommittedUpload {
    file_id: Uuid,
    owner_id: Uuid,
    file_name: String,
    storage_key: String,
    file_size: u64,
    chunk_count: u64,
}

impl CommittedUpload {
    pub(crate) fn from_session(
        session: &UploadSession,
        storage_key: String,
        file_size: u64,
        chunk_count: u64,
    ) -> Result<Self, AppError> {
        if session.status() != UploadStatus::Committed {
            return Err(AppError::InvalidState(format!(
                "upload {} is {}, not committed",
                session.file_id(),
                session.status()
            )));
        }
        Ok(Self {
            file_id: session.file_id(),
            owner_id: session.owner_id(),
            file_name: session.file_name().to_string(),
            storage_key,
            file_size,
            chunk_count,
        })
    }

    pub fn file_id(&self) -> Uuid {
        self.file_id
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }
}

/// Persists exactly one `FileRecord` per committed upload.
#[derive(Clone)]
pub struct MetadataWriter {
    store: Arc<dyn FileStore>,
    storage: Arc<dyn Storage>,
    cache: Arc<dyn SearchCache>,
}

impl MetadataWriter {
    pub fn new(
        store: Arc<dyn FileStore>,
        storage: Arc<dyn Storage>,
        cache: Arc<dyn SearchCache>,
    ) -> Self {
        Self {
            store,
            storage,
            cache,
        }
    }

    #[tracing::instrument(skip(self, upload), fields(file_id = %upload.file_id, owner_id = %upload.owner_id))]
    pub async fn write(&self, upload: CommittedUpload) -> Result<FileRecord, AppError> {
        let file_size = i64::try_from(upload.file_size)
            .map_err(|_| AppError::PayloadTooLarge("File size out of range".to_string()))?;
        let chunk_count = i32::try_from(upload.chunk_count)
            .map_err(|_| AppError::PayloadTooLarge("Too many chunks".to_string()))?;

        let record = NewFileRecord {
            id: upload.file_id,
            owner_id: upload.owner_id,
            file_name: upload.file_name.clone(),
            file_size,
            storage_url: self.storage.object_url(&upload.storage_key),
            storage_key: upload.storage_key.clone(),
            chunk_count,
        };

        let file = match self.store.insert(record).await {
            Ok(file) => file,
            Err(e) => {
                // The chunks are stored but no record points at them.
                tracing::error!(
                    error = %e,
                    storage_key = %upload.storage_key,
                    chunk_count = upload.chunk_count,
                    "Failed to persist file metadata after upload; chunks are orphaned"
                );
                return Err(e);
            }
        };

        invalidate_owner(self.cache.as_ref(), upload.owner_id).await;

        tracing::info!(
            file_size = file.file_size,
            chunk_count = file.chunk_count,
            "File metadata persisted"
        );

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockFileStore, MockStorage};
    use crate::InMemorySearchCache;

    #[test]
    fn only_committed_sessions_can_be_written() {
        let mut session = UploadSession::new(Uuid::new_v4(), "a.txt");
        assert!(CommittedUpload::from_session(&session, "k".into(), 1, 1).is_err());
        session.abort().unwrap();
        assert!(CommittedUpload::from_session(&session, "k".into(), 1, 1).is_err());

        let mut session = UploadSession::new(Uuid::new_v4(), "a.txt");
        session.commit().unwrap();
        let upload = CommittedUpload::from_session(&session, "k".into(), 1, 1).unwrap();
        assert_eq!(upload.file_id(), session.file_id());
    }

    #[tokio::test]
    async fn insert_failure_is_reported() {
        let store = Arc::new(MockFileStore::new());
        store.fail_inserts(true);
        let writer = MetadataWriter::new(
            store.clone(),
            Arc::new(MockStorage::new()),
            Arc::new(InMemorySearchCache::new()),
        );

        let mut session = UploadSession::new(Uuid::new_v4(), "a.txt");
        session.commit().unwrap();
        let upload = CommittedUpload::from_session(&session, "files/x/y".into(), 10, 1).unwrap();

        let err = writer.write(upload).await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(store.len(), 0);
    }
}
