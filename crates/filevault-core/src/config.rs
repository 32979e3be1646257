//! Configuration module
//!
//! Loads server, database, storage, upload pipeline and search cache settings
//! from the environment (with `.env` support through dotenvy).

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CHUNK_SIZE_BYTES, DEFAULT_CLEANUP_INTERVAL_SECS, DEFAULT_FILE_RETENTION_DAYS,
    DEFAULT_SEARCH_CACHE_TTL_SECS, DEFAULT_UPLOAD_QUEUE_DEPTH, DEFAULT_UPLOAD_WORKERS,
};
use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 1024;

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub environment: String,
}

/// Tuning for the chunked upload pipeline
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadConfig {
    /// Upper bound of a single chunk in bytes
    pub chunk_size_bytes: usize,
    /// Capacity of the reader -> worker queue
    pub queue_depth: usize,
    /// Concurrent workers per upload session
    pub workers: usize,
    pub max_upload_size_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size_bytes: DEFAULT_CHUNK_SIZE_BYTES,
            queue_depth: DEFAULT_UPLOAD_QUEUE_DEPTH,
            workers: DEFAULT_UPLOAD_WORKERS,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FilevaultConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub upload: UploadConfig,
    pub search_cache_ttl_secs: u64,
    /// 0 disables the expired file reaper
    pub file_retention_days: i64,
    pub cleanup_interval_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<FilevaultConfig>);

impl Config {
    fn inner(&self) -> &FilevaultConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.inner().server.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = FilevaultConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server.server_port
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().server.jwt_secret
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().server.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.inner().server.environment
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    /// S3_REGION falls back to AWS_REGION
    pub fn s3_region(&self) -> Option<&str> {
        self.inner()
            .s3_region
            .as_deref()
            .or(self.inner().aws_region.as_deref())
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn upload(&self) -> &UploadConfig {
        &self.inner().upload
    }

    pub fn search_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.inner().search_cache_ttl_secs)
    }

    pub fn file_retention_days(&self) -> i64 {
        self.inner().file_retention_days
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.inner().cleanup_interval_secs)
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl FilevaultConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let server = ServerConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            environment,
        };

        let storage_backend = match optional("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::S3,
        };

        let defaults = UploadConfig::default();
        let upload = UploadConfig {
            chunk_size_bytes: parse_or(
                "UPLOAD_CHUNK_SIZE_MB",
                defaults.chunk_size_bytes / (1024 * 1024),
            ) * 1024
                * 1024,
            queue_depth: parse_or("UPLOAD_QUEUE_DEPTH", defaults.queue_depth),
            workers: parse_or("UPLOAD_WORKERS", defaults.workers),
            max_upload_size_bytes: parse_or("MAX_UPLOAD_SIZE_MB", MAX_UPLOAD_SIZE_MB)
                * 1024
                * 1024,
        };

        Ok(Self {
            server,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: parse_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            storage_backend,
            s3_bucket: optional("S3_BUCKET"),
            s3_region: optional("S3_REGION"),
            s3_endpoint: optional("S3_ENDPOINT"),
            aws_region: optional("AWS_REGION"),
            local_storage_path: optional("LOCAL_STORAGE_PATH"),
            local_storage_base_url: optional("LOCAL_STORAGE_BASE_URL"),
            upload,
            search_cache_ttl_secs: parse_or("SEARCH_CACHE_TTL_SECS", DEFAULT_SEARCH_CACHE_TTL_SECS),
            file_retention_days: parse_or("FILE_RETENTION_DAYS", DEFAULT_FILE_RETENTION_DAYS),
            cleanup_interval_secs: parse_or("CLEANUP_INTERVAL_SECS", DEFAULT_CLEANUP_INTERVAL_SECS),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !(self.database_url.starts_with("postgresql://")
            || self.database_url.starts_with("postgres://"))
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.upload.chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!("UPLOAD_CHUNK_SIZE_MB must be greater than 0"));
        }
        if self.upload.queue_depth == 0 {
            return Err(anyhow::anyhow!("UPLOAD_QUEUE_DEPTH must be greater than 0"));
        }
        if self.upload.workers == 0 {
            return Err(anyhow::anyhow!("UPLOAD_WORKERS must be greater than 0"));
        }
        if self.file_retention_days < 0 {
            return Err(anyhow::anyhow!("FILE_RETENTION_DAYS cannot be negative"));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(anyhow::anyhow!("CLEANUP_INTERVAL_SECS must be greater than 0"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FilevaultConfig {
        FilevaultConfig {
            server: ServerConfig {
                server_port: 4000,
                cors_origins: vec!["*".to_string()],
                jwt_secret: "x".repeat(32),
                environment: "development".to_string(),
            },
            database_url: "postgres://localhost/filevault".to_string(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            storage_backend: StorageBackend::S3,
            s3_bucket: Some("bucket".to_string()),
            s3_region: None,
            s3_endpoint: None,
            aws_region: Some("eu-west-1".to_string()),
            local_storage_path: None,
            local_storage_base_url: None,
            upload: UploadConfig::default(),
            search_cache_ttl_secs: DEFAULT_SEARCH_CACHE_TTL_SECS,
            file_retention_days: DEFAULT_FILE_RETENTION_DAYS,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
        }
    }

    #[test]
    fn valid_sample_passes() {
        assert!(sample().validate().is_ok());
        let config = Config(Box::new(sample()));
        assert_eq!(config.s3_region(), Some("eu-west-1"));
        assert_eq!(config.upload().chunk_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.search_cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn short_jwt_secret_rejected() {
        let mut cfg = sample();
        cfg.server.jwt_secret = "short".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_workers_rejected() {
        let mut cfg = sample();
        cfg.upload.workers = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_cleanup_interval_rejected() {
        let mut cfg = sample();
        cfg.cleanup_interval_secs = 0;
        assert!(cfg.validate().is_err());
        cfg.cleanup_interval_secs = 60;
        cfg.file_retention_days = 0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn local_backend_requires_path() {
        let mut cfg = sample();
        cfg.storage_backend = StorageBackend::Local;
        assert!(cfg.validate().is_err());
        cfg.local_storage_path = Some("/tmp/filevault".to_string());
        cfg.local_storage_base_url = Some("http://localhost:4000/media".to_string());
        assert!(cfg.validate().is_ok());
    }
}
