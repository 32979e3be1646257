use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filevault_core::{AppError, FileRecord, NewFileRecord};
use filevault_db::{FileStore, SearchPredicate};
use uuid::Uuid;

/// A committed file of `owner_id`, uploaded now.
pub fn sample_record(owner_id: Uuid, file_name: &str) -> FileRecord {
    let id = Uuid::new_v4();
    let storage_key = format!("files/{}/{}", owner_id, id);
    FileRecord {
        id,
        owner_id,
        file_name: file_name.to_string(),
        file_size: 1024,
        storage_url: format!("mock://{}", storage_key),
        storage_key,
        chunk_count: 1,
        upload_date: Utc::now(),
    }
}

/// File metadata kept in a map, evaluating predicates the way the SQL does.
#[derive(Clone, Default)]
pub struct MockFileStore {
    files: Arc<Mutex<HashMap<Uuid, FileRecord>>>,
    fail_inserts: Arc<AtomicBool>,
    queries: Arc<AtomicUsize>,
}

impl MockFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Insert a record as-is, keeping its `upload_date`.
    pub fn seed(&self, record: FileRecord) {
        self.files.lock().unwrap().insert(record.id, record);
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.files.lock().unwrap().keys().copied().collect()
    }

    /// Number of `query` calls served
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn matches(predicate: &SearchPredicate, file: &FileRecord) -> bool {
        if file.owner_id != predicate.owner_id {
            return false;
        }
        if let Some(name) = &predicate.name_contains {
            if !file
                .file_name
                .to_lowercase()
                .contains(&name.to_lowercase())
            {
                return false;
            }
        }
        if let Some(date) = predicate.upload_date {
            if file.upload_date.date_naive() != date {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl FileStore for MockFileStore {
    async fn insert(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }

        let file = FileRecord {
            id: record.id,
            owner_id: record.owner_id,
            file_name: record.file_name,
            file_size: record.file_size,
            storage_url: record.storage_url,
            storage_key: record.storage_key,
            chunk_count: record.chunk_count,
            upload_date: Utc::now(),
        };
        self.files.lock().unwrap().insert(file.id, file.clone());
        Ok(file)
    }

    async fn query(&self, predicate: &SearchPredicate) -> Result<Vec<FileRecord>, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let mut files: Vec<FileRecord> = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| Self::matches(predicate, f))
            .cloned()
            .collect();
        files.sort_by(|a, b| {
            b.upload_date
                .cmp(&a.upload_date)
                .then_with(|| b.id.cmp(&a.id))
        });

        // OFFSET only travels with LIMIT, as in the SQL predicate.
        Ok(match predicate.limit {
            Some(limit) => files
                .into_iter()
                .skip(usize::try_from(predicate.offset).unwrap_or(0))
                .take(usize::try_from(limit).unwrap_or(0))
                .collect(),
            None => files,
        })
    }

    async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&id)
            .filter(|f| f.owner_id == owner_id)
            .cloned())
    }

    async fn update_file_name(
        &self,
        owner_id: Uuid,
        id: Uuid,
        file_name: &str,
    ) -> Result<Option<FileRecord>, AppError> {
        let mut files = self.files.lock().unwrap();
        Ok(files
            .get_mut(&id)
            .filter(|f| f.owner_id == owner_id)
            .map(|f| {
                f.file_name = file_name.to_string();
                f.clone()
            }))
    }

    async fn list_expired(&self, cutoff: DateTime<Utc>) -> Result<Vec<FileRecord>, AppError> {
        let mut files: Vec<FileRecord> = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.upload_date < cutoff)
            .cloned()
            .collect();
        files.sort_by_key(|f| f.upload_date);
        Ok(files)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.files.lock().unwrap().remove(&id).is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
