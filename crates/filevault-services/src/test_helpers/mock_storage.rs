use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use filevault_storage::{Storage, StorageBackend, StorageError, StorageResult};

/// Object storage kept in a map.
///
/// Puts of chunks registered with [`MockStorage::fail_chunk`] fail without
/// storing anything; the chunk index is read from the `chunk-NNNNNN` suffix.
#[derive(Clone, Default)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
    failing_chunks: Arc<Mutex<HashSet<u64>>>,
    fail_deletes: Arc<AtomicBool>,
    puts: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_chunk(&self, index: u64) {
        self.failing_chunks.lock().unwrap().insert(index);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Put attempts, failed ones included
    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Successful deletes of existing objects
    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_size(&self, key: &str) -> Option<usize> {
        self.objects.lock().unwrap().get(key).map(Bytes::len)
    }

    /// Store an object directly, bypassing failure injection.
    pub fn seed(&self, key: &str, data: Bytes) {
        self.objects.lock().unwrap().insert(key.to_string(), data);
    }

    fn chunk_index(key: &str) -> Option<u64> {
        key.rsplit_once("/chunk-")
            .and_then(|(_, index)| index.parse().ok())
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put_object(&self, storage_key: &str, data: Bytes) -> StorageResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        let failing = Self::chunk_index(storage_key)
            .is_some_and(|index| self.failing_chunks.lock().unwrap().contains(&index));
        if failing {
            return Err(StorageError::UploadFailed(format!(
                "injected failure for {}",
                storage_key
            )));
        }

        self.objects
            .lock()
            .unwrap()
            .insert(storage_key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed(format!(
                "injected failure for {}",
                storage_key
            )));
        }
        if self.objects.lock().unwrap().remove(storage_key).is_some() {
            self.deletes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        Ok(self.contains(storage_key))
    }

    fn object_url(&self, storage_key: &str) -> String {
        format!("mock://{}", storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
