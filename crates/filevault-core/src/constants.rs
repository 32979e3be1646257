//! Shared defaults for the upload pipeline and the search path.

/// Default chunk bound (10 MiB).
pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Default depth of the queue between the chunk reader and the upload workers.
pub const DEFAULT_UPLOAD_QUEUE_DEPTH: usize = 4;

/// Default number of concurrent upload workers per session.
pub const DEFAULT_UPLOAD_WORKERS: usize = 4;

/// Cached search results expire after five minutes.
pub const DEFAULT_SEARCH_CACHE_TTL_SECS: u64 = 300;

/// Files older than this are removed by the expired file reaper.
pub const DEFAULT_FILE_RETENTION_DAYS: i64 = 3;

pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 24 * 60 * 60;

pub const DEFAULT_SEARCH_LIMIT: i64 = 10;

pub const MAX_FILE_NAME_LEN: usize = 255;

/// Prefix shared by every search cache key.
pub const SEARCH_CACHE_PREFIX: &str = "file_search";
