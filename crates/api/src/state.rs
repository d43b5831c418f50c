use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::PhotoStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: canopy_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Observation photo storage.
    pub photos: Arc<PhotoStore>,
}

impl AppState {
    pub fn new(pool: canopy_db::DbPool, config: ServerConfig) -> Self {
        let photos = Arc::new(PhotoStore::new(config.photos.clone()));
        Self {
            pool,
            config: Arc::new(config),
            photos,
        }
    }
}
