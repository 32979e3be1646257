//! API constants

/// Versioned prefix of every file route
pub const API_PREFIX: &str = "/api/v0";

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Room for multipart boundaries and part headers on top of the file itself
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Default lifetime of tokens issued by `auth::jwt::issue_token`
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Server-wide cap on requests in flight
pub const HTTP_CONCURRENCY_LIMIT: usize = 10_000;
