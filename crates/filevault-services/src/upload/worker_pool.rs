//! Fixed-size pool of upload workers draining the chunk queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use filevault_core::Chunk;
use filevault_storage::keys::chunk_key;
use filevault_storage::{Storage, StorageError};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Result of the single put attempted for one chunk
#[derive(Debug)]
pub struct ChunkOutcome {
    pub index: u64,
    pub key: String,
    pub size: usize,
    pub result: Result<(), StorageError>,
}

#[derive(Debug, thiserror::Error)]
#[error("chunk {index} ({key})")]
pub struct ChunkFailure {
    pub index: u64,
    pub key: String,
    #[source]
    pub error: StorageError,
}

/// Everything the pool observed, gathered after every worker has exited.
#[derive(Debug, Default)]
pub struct PoolReport {
    /// Sorted by chunk index
    pub outcomes: Vec<ChunkOutcome>,
    pub panicked_workers: usize,
}

impl PoolReport {
    /// Split into acknowledged chunk keys and failures (both in index order).
    pub fn partition(self) -> (Vec<String>, Vec<ChunkFailure>) {
        let mut stored = Vec::new();
        let mut failures = Vec::new();
        for outcome in self.outcomes {
            match outcome.result {
                Ok(()) => stored.push(outcome.key),
                Err(error) => failures.push(ChunkFailure {
                    index: outcome.index,
                    key: outcome.key,
                    error,
                }),
            }
        }
        (stored, failures)
    }
}

pub struct WorkerPool {
    join_set: JoinSet<Vec<ChunkOutcome>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks sharing one receiver. Each dequeued chunk gets
    /// exactly one put under `{prefix}/chunk-{index}`; there is no retry.
    ///
    /// After the first failed put, workers stop taking new chunks. Puts that
    /// are already running finish normally.
    pub fn spawn(
        storage: Arc<dyn Storage>,
        receiver: mpsc::Receiver<Chunk>,
        workers: usize,
        prefix: String,
    ) -> Self {
        let shared_receiver = Arc::new(Mutex::new(receiver));
        let prefix: Arc<str> = Arc::from(prefix);
        let failed = Arc::new(AtomicBool::new(false));

        let mut join_set = JoinSet::new();
        for worker_idx in 0..workers.max(1) {
            let rx = Arc::clone(&shared_receiver);
            let storage = Arc::clone(&storage);
            let prefix = Arc::clone(&prefix);
            let failed = Arc::clone(&failed);

            join_set.spawn(async move { run_worker(worker_idx, rx, storage, prefix, failed).await });
        }

        Self { join_set }
    }

    /// Wait for every worker and collect their outcomes.
    pub async fn join(mut self) -> PoolReport {
        let mut report = PoolReport::default();

        while let Some(result) = self.join_set.join_next().await {
            match result {
                Ok(outcomes) => report.outcomes.extend(outcomes),
                Err(e) => {
                    tracing::error!(error = %e, "Upload worker terminated abnormally");
                    report.panicked_workers += 1;
                }
            }
        }

        report.outcomes.sort_by_key(|o| o.index);
        report
    }
}

async fn run_worker(
    worker_idx: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Chunk>>>,
    storage: Arc<dyn Storage>,
    prefix: Arc<str>,
    failed: Arc<AtomicBool>,
) -> Vec<ChunkOutcome> {
    let mut outcomes = Vec::new();

    loop {
        if failed.load(Ordering::Acquire) {
            break;
        }

        let Some(chunk) = receive_chunk(&receiver).await else {
            break;
        };

        // Another worker may have failed while this one waited on the queue.
        if failed.load(Ordering::Acquire) {
            break;
        }

        let key = chunk_key(&prefix, chunk.index);
        let size = chunk.len();
        let result = storage.put_object(&key, chunk.data).await;

        match &result {
            Ok(()) => {
                tracing::debug!(
                    worker = worker_idx,
                    chunk_index = chunk.index,
                    size_bytes = size,
                    "Chunk stored"
                );
            }
            Err(e) => {
                failed.store(true, Ordering::Release);
                tracing::warn!(
                    worker = worker_idx,
                    chunk_index = chunk.index,
                    key = %key,
                    error = %e,
                    "Chunk put failed"
                );
            }
        }

        outcomes.push(ChunkOutcome {
            index: chunk.index,
            key,
            size,
            result,
        });
    }

    tracing::trace!(worker = worker_idx, "Upload worker exiting");
    outcomes
}

async fn receive_chunk(receiver: &Arc<Mutex<mpsc::Receiver<Chunk>>>) -> Option<Chunk> {
    let mut guard = receiver.lock().await;
    guard.recv().await
}
