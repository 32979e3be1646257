//! Upload session orchestration: fan-out to the worker pool, fan-in of every
//! outcome, then a single commit-or-abort decision.

use std::sync::Arc;
use std::time::Instant;

use filevault_core::{AppError, FileRecord, UploadConfig, UploadSession};
use filevault_storage::keys::file_prefix;
use filevault_storage::Storage;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::chunk_reader::{ChunkReadError, ChunkReader, ReadSummary};
use super::metadata_writer::{CommittedUpload, MetadataWriter};
use super::worker_pool::{ChunkFailure, WorkerPool};

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The client stream failed; any put failures seen meanwhile are kept for diagnostics.
    #[error("failed to read upload stream: {source}")]
    Read {
        #[source]
        source: ChunkReadError,
        put_failures: Vec<ChunkFailure>,
    },

    /// Lowest-index failed put, plus every other failure in index order.
    #[error("failed to store {primary}")]
    Store {
        #[source]
        primary: ChunkFailure,
        others: Vec<ChunkFailure>,
    },

    #[error("{panicked} upload worker(s) terminated unexpectedly")]
    Worker { panicked: usize },

    #[error("upload incomplete: {stored} of {expected} chunks stored")]
    Incomplete { expected: u64, stored: u64 },

    #[error("failed to persist file metadata: {0}")]
    Metadata(#[source] AppError),
}

impl UploadError {
    /// Every failed chunk put, in index order.
    pub fn put_failures(&self) -> Vec<&ChunkFailure> {
        match self {
            UploadError::Read { put_failures, .. } => put_failures.iter().collect(),
            UploadError::Store { primary, others } => {
                std::iter::once(primary).chain(others.iter()).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Read {
                source: ChunkReadError::TooLarge { max_bytes },
                ..
            } => AppError::PayloadTooLarge(format!(
                "File exceeds the maximum upload size of {} bytes",
                max_bytes
            )),
            UploadError::Read {
                source: ChunkReadError::QueueClosed { index },
                ..
            } => AppError::Internal(format!(
                "upload queue closed before chunk {} was queued",
                index
            )),
            UploadError::Read {
                source: e @ ChunkReadError::Stream { .. },
                ..
            } => AppError::InvalidInput(format!("Failed to read upload stream: {}", e)),
            e @ UploadError::Store { .. } => AppError::Storage(e.to_string()),
            UploadError::Metadata(e) => e,
            e @ (UploadError::Worker { .. } | UploadError::Incomplete { .. }) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

/// Runs one upload request from stream to committed `FileRecord`.
#[derive(Clone)]
pub struct UploadCoordinator {
    storage: Arc<dyn Storage>,
    writer: MetadataWriter,
    config: UploadConfig,
}

impl UploadCoordinator {
    pub fn new(storage: Arc<dyn Storage>, writer: MetadataWriter, config: UploadConfig) -> Self {
        Self {
            storage,
            writer,
            config,
        }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Upload `reader` for `owner_id` under `file_name`.
    ///
    /// The reader runs on the calling task while the pool drains the queue;
    /// nothing is decided until both the reader and every worker are done.
    /// On abort, every acknowledged chunk is deleted on a best-effort basis
    /// and the primary error is returned.
    #[tracing::instrument(skip(self, reader), fields(owner_id = %owner_id, file_id = tracing::field::Empty))]
    pub async fn upload<R>(
        &self,
        owner_id: Uuid,
        file_name: &str,
        reader: R,
    ) -> Result<FileRecord, UploadError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut session = UploadSession::new(owner_id, file_name);
        tracing::Span::current().record("file_id", tracing::field::display(session.file_id()));

        let prefix = file_prefix(owner_id, session.file_id());
        let start = Instant::now();

        let (tx, rx) = mpsc::channel(self.config.queue_depth.max(1));
        let pool = WorkerPool::spawn(
            Arc::clone(&self.storage),
            rx,
            self.config.workers,
            prefix.clone(),
        );
        let chunk_reader = ChunkReader::new(reader, self.config.chunk_size_bytes)
            .with_limit(self.config.max_upload_size_bytes as u64);

        let (read_result, report) = tokio::join!(chunk_reader.pump(tx), pool.join());

        let panicked = report.panicked_workers;
        let (stored, failures) = report.partition();

        match decide(read_result, failures, panicked, stored.len() as u64) {
            Ok(summary) => {
                session.commit().map_err(UploadError::Metadata)?;
                tracing::info!(
                    chunk_count = summary.chunks,
                    size_bytes = summary.bytes,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "All chunks stored, upload committed"
                );

                let committed =
                    CommittedUpload::from_session(&session, prefix, summary.bytes, summary.chunks)
                        .map_err(UploadError::Metadata)?;
                self.writer
                    .write(committed)
                    .await
                    .map_err(UploadError::Metadata)
            }
            Err(err) => {
                session.abort().map_err(UploadError::Metadata)?;
                tracing::warn!(
                    error = %err,
                    failed_chunks = err.put_failures().len(),
                    stored_chunks = stored.len(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload aborted"
                );
                if panicked > 0 {
                    tracing::error!(
                        storage_key = %prefix,
                        "Chunks stored by terminated workers are unknown and may be orphaned"
                    );
                }
                self.compensate(&stored).await;
                Err(err)
            }
        }
    }

    /// Best-effort removal of chunks stored by an aborted session.
    async fn compensate(&self, stored: &[String]) {
        for key in stored {
            if let Err(e) = self.storage.delete(key).await {
                tracing::warn!(key = %key, error = %e, "Compensating delete failed, chunk orphaned");
            }
        }
        if !stored.is_empty() {
            tracing::debug!(deleted = stored.len(), "Compensating deletes issued");
        }
    }
}

/// Commit iff the stream was fully read, every put succeeded and every
/// emitted chunk was acknowledged.
fn decide(
    read_result: Result<ReadSummary, ChunkReadError>,
    mut failures: Vec<ChunkFailure>,
    panicked: usize,
    stored: u64,
) -> Result<ReadSummary, UploadError> {
    failures.sort_by_key(|f| f.index);

    match read_result {
        // A closed queue only means the workers quit early; their reason is the real error.
        Err(ChunkReadError::QueueClosed { .. }) if !failures.is_empty() || panicked > 0 => {}
        Err(source) => {
            return Err(UploadError::Read {
                source,
                put_failures: failures,
            })
        }
        Ok(summary) => {
            if failures.is_empty() && panicked == 0 {
                if summary.chunks != stored {
                    return Err(UploadError::Incomplete {
                        expected: summary.chunks,
                        stored,
                    });
                }
                return Ok(summary);
            }
        }
    }

    if failures.is_empty() {
        return Err(UploadError::Worker { panicked });
    }
    let primary = failures.remove(0);
    Err(UploadError::Store {
        primary,
        others: failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::InMemorySearchCache;
    use crate::test_helpers::{MockFileStore, MockStorage};
    use filevault_db::FileStore;
    use filevault_db::SearchPredicate;
    use filevault_storage::StorageError;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;

    const MIB: usize = 1024 * 1024;

    struct Harness {
        storage: Arc<MockStorage>,
        store: Arc<MockFileStore>,
        coordinator: UploadCoordinator,
    }

    fn harness(chunk_size: usize, workers: usize) -> Harness {
        let storage = Arc::new(MockStorage::new());
        let store = Arc::new(MockFileStore::new());
        let cache = Arc::new(InMemorySearchCache::new());
        let writer = MetadataWriter::new(store.clone(), storage.clone(), cache);
        let config = UploadConfig {
            chunk_size_bytes: chunk_size,
            queue_depth: 2,
            workers,
            max_upload_size_bytes: 1024 * MIB,
        };
        Harness {
            coordinator: UploadCoordinator::new(storage.clone(), writer, config),
            storage,
            store,
        }
    }

    /// Serves `ok_bytes` of zeros, then fails.
    struct BrokenStream {
        remaining: usize,
    }

    impl AsyncRead for BrokenStream {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.remaining == 0 {
                return Poll::Ready(Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated")));
            }
            let n = self.remaining.min(buf.remaining());
            buf.put_slice(&vec![0u8; n]);
            self.remaining -= n;
            Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn twenty_five_mib_upload_commits_three_chunks() {
        let h = harness(10 * MIB, 3);
        let owner = Uuid::new_v4();
        let data = vec![42u8; 25 * MIB];

        let file = h
            .coordinator
            .upload(owner, "big.bin", &data[..])
            .await
            .unwrap();

        assert_eq!(file.file_size, (25 * MIB) as i64);
        assert_eq!(file.chunk_count, 3);
        assert_eq!(file.file_name, "big.bin");
        assert_eq!(h.storage.put_count(), 3);

        let prefix = file_prefix(owner, file.id);
        assert_eq!(file.storage_key, prefix);
        assert_eq!(h.storage.object_size(&format!("{}/chunk-000000", prefix)), Some(10 * MIB));
        assert_eq!(h.storage.object_size(&format!("{}/chunk-000001", prefix)), Some(10 * MIB));
        assert_eq!(h.storage.object_size(&format!("{}/chunk-000002", prefix)), Some(5 * MIB));
        assert_eq!(file.storage_url, format!("mock://{}", prefix));

        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn empty_stream_commits_zero_sized_file() {
        let h = harness(16, 2);
        let file = h
            .coordinator
            .upload(Uuid::new_v4(), "empty.txt", &b""[..])
            .await
            .unwrap();
        assert_eq!(file.file_size, 0);
        assert_eq!(file.chunk_count, 0);
        assert_eq!(h.storage.put_count(), 0);
        assert_eq!(h.store.len(), 1);
    }

    #[tokio::test]
    async fn any_put_failure_leaves_no_record() {
        // First, middle and last chunk of a five-chunk upload.
        for failing in [0u64, 2, 4] {
            let h = harness(10, 2);
            h.storage.fail_chunk(failing);
            let owner = Uuid::new_v4();

            let err = h
                .coordinator
                .upload(owner, "doc.txt", &[1u8; 50][..])
                .await
                .unwrap_err();

            match &err {
                UploadError::Store { primary, .. } => assert_eq!(primary.index, failing),
                other => panic!("unexpected error: {other:?}"),
            }
            assert!(matches!(AppError::from(err), AppError::Storage(_)));
            assert_eq!(h.store.len(), 0);
            let files = h
                .store
                .query(&SearchPredicate::for_owner(owner))
                .await
                .unwrap();
            assert!(files.is_empty());
        }
    }

    #[tokio::test]
    async fn abort_deletes_acknowledged_chunks() {
        let h = harness(10, 1);
        h.storage.fail_chunk(3);

        let err = h
            .coordinator
            .upload(Uuid::new_v4(), "doc.txt", &[1u8; 60][..])
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Store { .. }));
        // Chunks 0..=2 were stored by the single worker, then removed.
        assert_eq!(h.storage.delete_count(), 3);
        assert_eq!(h.storage.object_count(), 0);
        assert_eq!(h.store.len(), 0);
    }

    #[tokio::test]
    async fn compensating_delete_failures_do_not_mask_primary_error() {
        let h = harness(10, 1);
        h.storage.fail_chunk(1);
        h.storage.fail_deletes(true);

        let err = h
            .coordinator
            .upload(Uuid::new_v4(), "doc.txt", &[1u8; 30][..])
            .await
            .unwrap_err();

        match err {
            UploadError::Store { primary, .. } => {
                assert_eq!(primary.index, 1);
                assert!(matches!(primary.error, StorageError::UploadFailed(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(h.storage.object_count(), 1);
    }

    #[tokio::test]
    async fn read_failure_aborts_as_client_error() {
        let h = harness(8, 2);

        let err = h
            .coordinator
            .upload(Uuid::new_v4(), "cut.bin", BrokenStream { remaining: 20 })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UploadError::Read {
                source: ChunkReadError::Stream { .. },
                ..
            }
        ));
        assert!(matches!(AppError::from(err), AppError::InvalidInput(_)));
        assert_eq!(h.store.len(), 0);
        // Chunks 0 and 1 went out before the stream broke and were cleaned up.
        assert_eq!(h.storage.object_count(), 0);
    }

    #[tokio::test]
    async fn oversize_upload_is_rejected() {
        let mut h = harness(8, 2);
        h.coordinator.config.max_upload_size_bytes = 16;

        let err = h
            .coordinator
            .upload(Uuid::new_v4(), "big.bin", &[0u8; 40][..])
            .await
            .unwrap_err();

        assert!(matches!(
            AppError::from(err),
            AppError::PayloadTooLarge(_)
        ));
        assert_eq!(h.store.len(), 0);
    }

    #[tokio::test]
    async fn metadata_failure_surfaces_as_database_error() {
        let h = harness(8, 2);
        h.store.fail_inserts(true);

        let err = h
            .coordinator
            .upload(Uuid::new_v4(), "a.bin", &[0u8; 20][..])
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Metadata(AppError::Database(_))));
        // Chunks stay in storage; no compensation after commit.
        assert_eq!(h.storage.object_count(), 3);
    }

    #[test]
    fn queue_closed_defers_to_put_failure() {
        let failure = ChunkFailure {
            index: 5,
            key: "k5".into(),
            error: StorageError::UploadFailed("boom".into()),
        };
        let err = decide(
            Err(ChunkReadError::QueueClosed { index: 9 }),
            vec![failure],
            0,
            3,
        )
        .unwrap_err();
        assert!(matches!(err, UploadError::Store { ref primary, .. } if primary.index == 5));
    }

    #[test]
    fn lowest_index_failure_is_primary() {
        let failures = vec![
            ChunkFailure {
                index: 7,
                key: "k7".into(),
                error: StorageError::UploadFailed("late".into()),
            },
            ChunkFailure {
                index: 2,
                key: "k2".into(),
                error: StorageError::UploadFailed("early".into()),
            },
        ];
        let err = decide(
            Ok(ReadSummary {
                chunks: 10,
                bytes: 100,
            }),
            failures,
            0,
            8,
        )
        .unwrap_err();
        let listed: Vec<u64> = err.put_failures().iter().map(|f| f.index).collect();
        assert_eq!(listed, vec![2, 7]);
    }
}
