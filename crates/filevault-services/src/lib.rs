//! Filevault Services Layer
//!
//! Business services sitting between the HTTP surface and the storage and
//! database capabilities: the concurrent chunked upload pipeline, the cached
//! file search and the expired file reaper. Keep business logic and
//! coordination here; keep thin HTTP handling in filevault-api.

pub mod cleanup;
pub mod search;
pub mod upload;

// Test doubles for the capability traits
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use cleanup::{ExpiredFileReaper, ReapSummary};
pub use filevault_db::{FileRepository, FileStore, SearchPredicate};
pub use filevault_storage::{create_storage, Storage, StorageBackend, StorageError};
pub use search::{CacheError, FileCatalog, InMemorySearchCache, SearchCache};
pub use upload::{
    ChunkFailure, ChunkReadError, ChunkReader, CommittedUpload, MetadataWriter, UploadCoordinator,
    UploadError, WorkerPool,
};
