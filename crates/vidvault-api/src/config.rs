//! API configuration.

use std::path::PathBuf;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Shared secret expected in the `x-api-key` header
    pub api_key: String,
    /// SQLite database URL
    pub database_url: String,
    /// Directory holding uploaded and derived video files
    pub storage_dir: PathBuf,
    /// Maximum upload size in megabytes
    pub max_size_mb: u64,
    /// Maximum allowed video duration in seconds
    pub max_duration_secs: i64,
    /// Lifetime of issued share links in seconds
    pub share_ttl_secs: i64,
    /// Path of the persistent access log
    pub access_log_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_key: String::new(),
            database_url: "sqlite:db.sqlite?mode=rwc".to_string(),
            storage_dir: PathBuf::from("./storage"),
            max_size_mb: 10,
            max_duration_secs: 30,
            share_ttl_secs: 3600,
            access_log_path: PathBuf::from("access.log"),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            api_key: std::env::var("API_KEY").unwrap_or(defaults.api_key),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            storage_dir: std::env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            max_size_mb: std::env::var("MAX_SIZE_IN_MB")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_size_mb),
            max_duration_secs: std::env::var("MAX_DURATION_IN_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_duration_secs),
            share_ttl_secs: std::env::var("SHARE_LINK_EXPIRY_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.share_ttl_secs),
            access_log_path: std::env::var("ACCESS_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.access_log_path),
        }
    }

    /// Maximum upload size in bytes.
    pub fn max_size_bytes(&self) -> usize {
        (self.max_size_mb as usize) * 1024 * 1024
    }

    /// Request body limit: the upload cap plus headroom for multipart
    /// framing around the file itself.
    pub fn max_body_size(&self) -> usize {
        self.max_size_bytes() + 64 * 1024
    }
}
