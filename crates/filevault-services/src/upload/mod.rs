//! Concurrent chunked upload pipeline.
//!
//! A single reader splits the incoming stream into bounded chunks and feeds a
//! bounded queue; a pool of workers drains the queue with one storage put per
//! chunk; the coordinator waits for both sides before committing or aborting.

pub mod chunk_reader;
pub mod coordinator;
pub mod metadata_writer;
pub mod worker_pool;

pub use chunk_reader::{ChunkReadError, ChunkReader, ReadSummary};
pub use coordinator::{UploadCoordinator, UploadError};
pub use metadata_writer::{CommittedUpload, MetadataWriter};
pub use worker_pool::{ChunkFailure, ChunkOutcome, PoolReport, WorkerPool};
