//! Video endpoints: upload, trim, merge, share, shared streaming.
//!
//! Handlers translate between the wire and the lifecycle service.
//! Domain outcomes that the callers act on (missing videos, bad merge
//! batches, spent share links) keep their status; everything else is
//! flattened to a generic 500 so engine and database detail never
//! leaves the server.

use std::path::Path;

use axum::body::Body;
use axum::extract::{Multipart, Path as UrlPath, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};
use validator::Validate;

use vidvault_models::{
    generate_stored_name, MergeRequest, NewUpload, ShareLinkResponse, ShareRequest, TrimRequest,
    VideoId, VideoResponse,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field holding the video file.
const UPLOAD_FIELD: &str = "file";

/// Accepted upload content type.
const UPLOAD_CONTENT_TYPE: &str = "video/mp4";

/// POST /videos/upload: accept a multipart MP4 upload.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut saved: Option<NewUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let original_filename = field.file_name().unwrap_or("upload.mp4").to_string();

        let content_type = field.content_type().unwrap_or("").to_string();
        if content_type != UPLOAD_CONTENT_TYPE {
            return Err(ApiError::bad_request("Invalid type"));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;

        if data.len() > state.config.max_size_bytes() {
            return Err(ApiError::bad_request(format!(
                "File exceeds the maximum allowed size of {} MB",
                state.config.max_size_mb
            )));
        }

        let filename = generate_stored_name(&original_filename);
        let path = state.config.storage_dir.join(&filename);
        let size_bytes = data.len() as i64;

        tokio::fs::write(&path, &data).await.map_err(|e| {
            error!("Failed to write upload to {}: {e}", path.display());
            ApiError::internal("Failed to upload video")
        })?;

        saved = Some(NewUpload {
            filename,
            original_filename,
            path: path.to_string_lossy().into_owned(),
            size_bytes,
        });
        break;
    }

    let upload = saved.ok_or_else(|| ApiError::bad_request("File is required"))?;

    let max_secs = state.config.max_duration_secs;
    if !state
        .videos
        .duration_within_limit(Path::new(&upload.path), max_secs)
        .await
    {
        if let Err(e) = tokio::fs::remove_file(&upload.path).await {
            warn!("Failed to remove rejected upload {}: {e}", upload.path);
        }
        return Err(ApiError::bad_request(format!(
            "Video duration exceeds the maximum allowed duration of {max_secs} seconds"
        )));
    }

    let video = state.videos.ingest(upload).await.map_err(|e| {
        error!("Failed to ingest upload: {e}");
        ApiError::internal("Failed to upload video")
    })?;

    info!(id = %video.id, "Uploaded video");

    Ok((
        StatusCode::CREATED,
        Json(VideoResponse::new("File uploaded successfully", video)),
    ))
}

/// POST /videos/trim: derive a new video from a range of an existing one.
pub async fn trim(
    State(state): State<AppState>,
    Json(req): Json<TrimRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    // An inverted range slips past field-level validation and dies here,
    // behind the same generic body as any other trim failure.
    if req.start_time >= req.end_time {
        error!(
            "Rejected trim: start time {} is not before end time {}",
            req.start_time, req.end_time
        );
        return Err(ApiError::internal("Failed to trim video"));
    }

    let video = state
        .videos
        .trim(&VideoId::from(req.id), req.start_time, req.end_time)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => e,
            other => {
                error!("Failed to trim video: {other}");
                ApiError::internal("Failed to trim video")
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(VideoResponse::new("Video trimmed successfully", video)),
    ))
}

/// POST /videos/merge: concatenate videos in request order.
pub async fn merge(
    State(state): State<AppState>,
    Json(req): Json<MergeRequest>,
) -> ApiResult<impl IntoResponse> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let ids: Vec<VideoId> = req.video_ids.iter().copied().map(VideoId::from).collect();

    let video = state.videos.merge(&ids).await.map_err(|e| match e {
        ApiError::NotFound(_) | ApiError::BadRequest(_) => e,
        other => {
            error!("Failed to merge videos: {other}");
            ApiError::internal("Failed to merge videos")
        }
    })?;

    Ok((
        StatusCode::CREATED,
        Json(VideoResponse::new("Videos merged successfully", video)),
    ))
}

/// POST /videos/share: issue a tokened link for a video.
pub async fn share(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ShareRequest>,
) -> ApiResult<impl IntoResponse> {
    let video = state
        .videos
        .issue_share_link(&VideoId::from(req.id))
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => e,
            other => {
                error!("Failed to generate share link: {other}");
                ApiError::internal("Failed to generate share link")
            }
        })?;

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    // Both fields are set by issuance; empty only if the row is bare.
    let token = video.share_token.clone().unwrap_or_default();
    let expiry = video.share_expiry_ms.unwrap_or_default();

    Ok((
        StatusCode::CREATED,
        Json(ShareLinkResponse {
            message: "Share link generated successfully".to_string(),
            link: format!("http://{host}/videos/shared/{token}"),
            expiry,
        }),
    ))
}

/// GET /videos/shared: the token segment is missing entirely.
pub async fn shared_token_required() -> ApiError {
    ApiError::unauthorized("Share link token is required")
}

/// GET /videos/shared/{token}: stream a shared video.
pub async fn shared(
    State(state): State<AppState>,
    UrlPath(token): UrlPath<String>,
) -> ApiResult<Response> {
    let (video, file) = state
        .videos
        .resolve_shared_stream(&token)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) | ApiError::Unauthorized(_) => e,
            other => {
                error!("Failed to resolve shared video: {other}");
                ApiError::not_found("Video not found or share link expired")
            }
        })?;

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, UPLOAD_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", video.original_filename),
        )
        .body(body)
        .map_err(|e| ApiError::internal(format!("Failed to build stream response: {e}")))?;

    Ok(response)
}
