//! The persisted video record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a stored video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<Uuid> for VideoId {
    fn from(u: Uuid) -> Self {
        Self(u.to_string())
    }
}

/// Descriptor for a file already written to the storage directory,
/// handed to the lifecycle service for ingestion.
#[derive(Debug, Clone)]
pub struct NewUpload {
    /// Server-assigned stored filename.
    pub filename: String,
    /// Client-supplied or synthesized label.
    pub original_filename: String,
    /// Path of the backing file.
    pub path: String,
    /// Size in bytes (0 for derived outputs).
    pub size_bytes: i64,
}

/// A video row as persisted in the `videos` table.
///
/// `duration_ms` is 0 until the post-ingest probe succeeds and stays 0
/// forever if it fails. `share_token` and `share_expiry_ms` are either
/// both null or both set; re-issuing a share link overwrites both.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: VideoId,
    pub filename: String,
    pub original_filename: String,
    pub path: String,
    pub duration_ms: i64,
    pub size_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_expiry_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Create a new unprobed record for a freshly stored file.
    pub fn new(upload: &NewUpload) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            filename: upload.filename.clone(),
            original_filename: upload.original_filename.clone(),
            path: upload.path.clone(),
            duration_ms: 0,
            size_bytes: upload.size_bytes,
            share_token: None,
            share_expiry_ms: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a share token and its expiry, replacing any prior token.
    pub fn with_share(mut self, token: String, expiry_ms: i64) -> Self {
        self.share_token = Some(token);
        self.share_expiry_ms = Some(expiry_ms);
        self.updated_at = Utc::now();
        self
    }

    /// Whether the share link has expired as of `now_ms`.
    ///
    /// A record without an expiry is never considered expired; expired
    /// tokens are kept in place and simply stop resolving.
    pub fn share_expired(&self, now_ms: i64) -> bool {
        self.share_expiry_ms.map(|e| e < now_ms).unwrap_or(false)
    }
}

/// Current time as epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> NewUpload {
        NewUpload {
            filename: "abc123.mp4".to_string(),
            original_filename: "holiday.mp4".to_string(),
            path: "./storage/abc123.mp4".to_string(),
            size_bytes: 1024,
        }
    }

    #[test]
    fn test_video_id_generation() {
        let id1 = VideoId::new();
        let id2 = VideoId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_video_is_unprobed_and_unshared() {
        let video = Video::new(&upload());
        assert_eq!(video.duration_ms, 0);
        assert_eq!(video.size_bytes, 1024);
        assert!(video.share_token.is_none());
        assert!(video.share_expiry_ms.is_none());
    }

    #[test]
    fn test_share_expiry() {
        let video = Video::new(&upload());
        assert!(!video.share_expired(now_ms()));

        let shared = video.clone().with_share("token".to_string(), now_ms() - 1);
        assert!(shared.share_expired(now_ms()));

        let live = video.with_share("token".to_string(), now_ms() + 60_000);
        assert!(!live.share_expired(now_ms()));
    }
}
