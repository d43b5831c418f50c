use std::path::PathBuf;

use anyhow::Context;

use crate::auth::jwt::JwtConfig;

/// Default upper bound for one uploaded observation photo (10 MiB).
const DEFAULT_MAX_PHOTO_BYTES: usize = 10 * 1024 * 1024;

/// Where observation photos are written and how they are addressed.
#[derive(Debug, Clone)]
pub struct PhotoConfig {
    /// Directory uploaded photos are stored in.
    pub storage_dir: PathBuf,
    /// URL prefix the directory is served under.
    pub base_url: String,
    /// Largest accepted upload, in bytes.
    pub max_bytes: usize,
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long in-flight requests may drain after a shutdown signal (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT verification settings.
    pub jwt: JwtConfig,
    /// Observation photo storage.
    pub photos: PhotoConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                    |
    /// |-------------------------|----------------------------|
    /// | `HOST`                  | `0.0.0.0`                  |
    /// | `PORT`                  | `3000`                     |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                       |
    /// | `PHOTO_STORAGE_DIR`     | `storage/photos`           |
    /// | `PHOTO_BASE_URL`        | `/media/photos`            |
    /// | `MAX_PHOTO_BYTES`       | `10485760`                 |
    pub fn from_env() -> anyhow::Result<Self> {
        let host = env_or("HOST", "0.0.0.0");
        let port: u16 = env_or("PORT", "3000")
            .parse()
            .context("PORT must be a valid u16")?;

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a valid u64")?;
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", "30")
            .parse()
            .context("SHUTDOWN_TIMEOUT_SECS must be a valid u64")?;

        let photos = PhotoConfig {
            storage_dir: PathBuf::from(env_or("PHOTO_STORAGE_DIR", "storage/photos")),
            base_url: env_or("PHOTO_BASE_URL", "/media/photos")
                .trim_end_matches('/')
                .to_string(),
            max_bytes: env_or("MAX_PHOTO_BYTES", &DEFAULT_MAX_PHOTO_BYTES.to_string())
                .parse()
                .context("MAX_PHOTO_BYTES must be a valid usize")?,
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env()?,
            photos,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
