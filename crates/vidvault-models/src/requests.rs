//! API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::video::Video;

/// Request to trim an existing video into a new one.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrimRequest {
    /// Source video ID.
    pub id: Uuid,

    /// Start offset in seconds (must be positive).
    #[validate(range(exclusive_min = 0.0, message = "startTime must be positive"))]
    pub start_time: f64,

    /// End offset in seconds.
    #[validate(range(min = 1.0, message = "endTime must be at least 1"))]
    pub end_time: f64,
}

/// Request to merge two or more videos, in the given order.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    /// Ordered list of source video IDs (at least 2).
    #[validate(length(min = 2, message = "at least two video IDs are required"))]
    pub video_ids: Vec<Uuid>,
}

/// Request to issue a share link for a video.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShareRequest {
    /// Video ID to share.
    pub id: Uuid,
}

/// Standard success envelope carrying a video record.
#[derive(Debug, Clone, Serialize)]
pub struct VideoResponse {
    pub message: String,
    pub data: Video,
}

impl VideoResponse {
    pub fn new(message: impl Into<String>, data: Video) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Response for share-link issuance.
#[derive(Debug, Clone, Serialize)]
pub struct ShareLinkResponse {
    pub message: String,
    /// Absolute URL of the shared stream.
    pub link: String,
    /// Expiry as epoch milliseconds.
    pub expiry: i64,
}
