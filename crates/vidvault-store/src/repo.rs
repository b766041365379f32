//! Video repository.

use chrono::Utc;
use tracing::debug;

use vidvault_models::{Video, VideoId};

use crate::error::StoreResult;
use crate::DbPool;

const COLUMNS: &str = "id, filename, original_filename, path, duration_ms, size_bytes, \
                       share_token, share_expiry_ms, created_at, updated_at";

/// Repository over the `videos` table.
///
/// Single-row creates and updates are atomic; that is all the rest of
/// the system assumes of the store.
#[derive(Clone)]
pub struct VideoRepository {
    pool: DbPool,
}

impl VideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new video row.
    pub async fn create(&self, video: &Video) -> StoreResult<Video> {
        let row = sqlx::query_as::<_, Video>(&format!(
            r#"
            INSERT INTO videos ({COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(&video.id)
        .bind(&video.filename)
        .bind(&video.original_filename)
        .bind(&video.path)
        .bind(video.duration_ms)
        .bind(video.size_bytes)
        .bind(&video.share_token)
        .bind(video.share_expiry_ms)
        .bind(video.created_at)
        .bind(video.updated_at)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %row.id, filename = %row.filename, "Created video row");
        Ok(row)
    }

    /// Find a video by ID.
    pub async fn find(&self, id: &VideoId) -> StoreResult<Option<Video>> {
        let row = sqlx::query_as::<_, Video>(&format!(
            "SELECT {COLUMNS} FROM videos WHERE id = ?",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Fetch all rows matching the given IDs in one query.
    ///
    /// Result order is whatever the database returns; callers that care
    /// about order must re-sort against their own ID list.
    pub async fn find_by_ids(&self, ids: &[VideoId]) -> StoreResult<Vec<Video>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!("SELECT {COLUMNS} FROM videos WHERE id IN ({placeholders})");

        let mut q = sqlx::query_as::<_, Video>(&query);
        for id in ids {
            q = q.bind(id);
        }

        let rows = q.fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Find a video by its exact share token.
    pub async fn find_by_share_token(&self, token: &str) -> StoreResult<Option<Video>> {
        let row = sqlx::query_as::<_, Video>(&format!(
            "SELECT {COLUMNS} FROM videos WHERE share_token = ?",
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Persist the mutable fields of an existing row.
    ///
    /// `updated_at` is refreshed by the store; `id`, `created_at` and the
    /// file identity columns never change after creation.
    pub async fn update(&self, video: &Video) -> StoreResult<Video> {
        let row = sqlx::query_as::<_, Video>(&format!(
            r#"
            UPDATE videos
            SET duration_ms = ?, share_token = ?, share_expiry_ms = ?, updated_at = ?
            WHERE id = ?
            RETURNING {COLUMNS}
            "#,
        ))
        .bind(video.duration_ms)
        .bind(&video.share_token)
        .bind(video.share_expiry_ms)
        .bind(Utc::now())
        .bind(&video.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}
