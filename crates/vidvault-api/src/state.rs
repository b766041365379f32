//! Application state.

use std::sync::Arc;

use vidvault_media::FfmpegEngine;
use vidvault_store::VideoRepository;

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::services::VideoService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub videos: VideoService,
}

impl AppState {
    /// Create application state: open the pool, bootstrap the schema,
    /// make sure the storage directory exists, wire up the service.
    pub async fn new(config: ApiConfig) -> ApiResult<Self> {
        let pool = vidvault_store::create_pool(&config.database_url).await?;
        vidvault_store::init_schema(&pool).await?;

        tokio::fs::create_dir_all(&config.storage_dir)
            .await
            .map_err(|e| {
                crate::error::ApiError::internal(format!(
                    "Failed to create storage directory {}: {e}",
                    config.storage_dir.display()
                ))
            })?;

        let videos = VideoService::new(
            VideoRepository::new(pool),
            Arc::new(FfmpegEngine::new()),
            config.storage_dir.clone(),
            config.share_ttl_secs,
        );

        Ok(Self { config, videos })
    }
}
