//! Video lifecycle service.
//!
//! Owns the artifact lifecycle: ingest a stored file, derive new videos
//! from existing ones (trim, merge), issue share links and resolve them
//! into streams. Derived videos are brand-new rows; source rows are
//! never touched by a derive operation, and nothing links an output back
//! to its inputs beyond the synthesized name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tracing::{info, warn};

use vidvault_media::MediaEngine;
use vidvault_models::{
    generate_share_token, generate_stored_name, now_ms, NewUpload, Video, VideoId,
};
use vidvault_store::VideoRepository;

use crate::error::{ApiError, ApiResult};

/// Synthesized label for merge outputs.
const MERGED_NAME: &str = "merged_video.mp4";

/// Orchestrates the video lifecycle against the store and the engine.
#[derive(Clone)]
pub struct VideoService {
    repo: VideoRepository,
    engine: Arc<dyn MediaEngine>,
    storage_dir: PathBuf,
    share_ttl_secs: i64,
}

impl VideoService {
    pub fn new(
        repo: VideoRepository,
        engine: Arc<dyn MediaEngine>,
        storage_dir: PathBuf,
        share_ttl_secs: i64,
    ) -> Self {
        Self {
            repo,
            engine,
            storage_dir,
            share_ttl_secs,
        }
    }

    /// Persist a stored file as a new video and probe its duration.
    ///
    /// The probe runs before this returns but its failure is tolerated:
    /// an unprobeable file is kept with `duration_ms = 0` and is never
    /// re-probed. Once the initial persist succeeds, ingestion succeeds.
    pub async fn ingest(&self, upload: NewUpload) -> ApiResult<Video> {
        let video = self.repo.create(&Video::new(&upload)).await?;

        let duration_ms = match self.engine.probe_duration_ms(Path::new(&video.path)).await {
            Ok(ms) => ms,
            Err(e) => {
                warn!(id = %video.id, "Error probing video: {e}");
                return Ok(video);
            }
        };

        let mut probed = video.clone();
        probed.duration_ms = duration_ms;
        match self.repo.update(&probed).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                warn!(id = %video.id, "Error updating video duration: {e}");
                Ok(video)
            }
        }
    }

    /// Trim a new video out of an existing one.
    ///
    /// The range is passed to the engine exactly as requested; degenerate
    /// ranges are the engine's failure to raise. Engine failure leaves no
    /// row behind and propagates unchanged.
    pub async fn trim(&self, id: &VideoId, start_secs: f64, end_secs: f64) -> ApiResult<Video> {
        let source = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Video with ID {id} not found")))?;

        let duration_secs = end_secs - start_secs;
        let original_filename = format!("trimmed_{}", source.original_filename);
        let filename = generate_stored_name(&original_filename);
        let output = self.storage_dir.join(&filename);

        self.engine
            .trim(Path::new(&source.path), &output, start_secs, duration_secs)
            .await?;

        info!(source = %source.id, "Trimmed video, ingesting output");

        self.ingest(NewUpload {
            filename,
            original_filename,
            path: output.to_string_lossy().into_owned(),
            size_bytes: 0,
        })
        .await
    }

    /// Merge two or more videos into a new one, in the given order.
    ///
    /// The batch fetch does not preserve request order, so resolved rows
    /// are mapped back onto the caller's ID list before the engine runs.
    pub async fn merge(&self, ids: &[VideoId]) -> ApiResult<Video> {
        if ids.len() < 2 {
            return Err(ApiError::bad_request(
                "At least two videos are required to merge",
            ));
        }

        let rows = self.repo.find_by_ids(ids).await?;
        let by_id: HashMap<&str, &Video> =
            rows.iter().map(|v| (v.id.as_str(), v)).collect();

        let missing: Vec<&str> = ids
            .iter()
            .filter(|id| !by_id.contains_key(id.as_str()))
            .map(|id| id.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::not_found(format!(
                "Videos with IDs {} not found",
                missing.join(", ")
            )));
        }

        let inputs: Vec<PathBuf> = ids
            .iter()
            .map(|id| PathBuf::from(&by_id[id.as_str()].path))
            .collect();

        let filename = generate_stored_name(MERGED_NAME);
        let output = self.storage_dir.join(&filename);

        self.engine.merge(&inputs, &output).await?;

        info!(count = ids.len(), "Merged videos, ingesting output");

        self.ingest(NewUpload {
            filename,
            original_filename: MERGED_NAME.to_string(),
            path: output.to_string_lossy().into_owned(),
            size_bytes: 0,
        })
        .await
    }

    /// Issue a share link for a video.
    ///
    /// Mints a fresh token and expiry, overwriting any previous pair;
    /// the old token stops resolving the moment this persists. Tokens are
    /// drawn from a 128-bit namespace; no uniqueness check is made.
    pub async fn issue_share_link(&self, id: &VideoId) -> ApiResult<Video> {
        let video = self
            .repo
            .find(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Video with ID {id} not found")))?;

        let token = generate_share_token();
        let expiry_ms = now_ms() + self.share_ttl_secs * 1000;

        let updated = self.repo.update(&video.with_share(token, expiry_ms)).await?;
        info!(id = %updated.id, "Issued share link");
        Ok(updated)
    }

    /// Resolve a share token into the video record and an open stream.
    ///
    /// The token is the sole credential: unknown tokens are `NotFound`,
    /// expired ones `Unauthorized`. Expired tokens stay on the row; only
    /// re-issuing makes the video reachable again.
    pub async fn resolve_shared_stream(&self, token: &str) -> ApiResult<(Video, File)> {
        let video = self
            .repo
            .find_by_share_token(token)
            .await?
            .ok_or_else(|| ApiError::not_found("Video not found"))?;

        if video.share_expired(now_ms()) {
            return Err(ApiError::unauthorized("Share link has expired"));
        }

        let file = File::open(&video.path).await.map_err(|e| {
            warn!(id = %video.id, "Failed to open shared video file: {e}");
            ApiError::not_found("Video not found or share link expired")
        })?;

        Ok((video, file))
    }

    /// Check an uploaded file against the configured duration cap.
    ///
    /// Probe failure is tolerated here exactly as it is during ingest:
    /// an unprobeable upload passes validation and ends up with a zero
    /// duration.
    pub async fn duration_within_limit(&self, path: &Path, max_secs: i64) -> bool {
        match self.engine.probe_duration_ms(path).await {
            Ok(ms) => ms <= max_secs * 1000,
            Err(e) => {
                warn!("ffprobe error during upload validation: {e}");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate;
    use vidvault_media::{MediaError, MockMediaEngine};

    async fn test_repo() -> VideoRepository {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        vidvault_store::init_schema(&pool).await.unwrap();
        VideoRepository::new(pool)
    }

    fn service(repo: VideoRepository, engine: MockMediaEngine) -> VideoService {
        VideoService::new(repo, Arc::new(engine), PathBuf::from("/tmp/vidvault-test"), 3600)
    }

    fn upload(name: &str) -> NewUpload {
        NewUpload {
            filename: format!("{name}.stored.mp4"),
            original_filename: format!("{name}.mp4"),
            path: format!("/tmp/vidvault-test/{name}.stored.mp4"),
            size_bytes: 100,
        }
    }

    #[tokio::test]
    async fn test_ingest_sets_probed_duration() {
        let mut engine = MockMediaEngine::new();
        engine
            .expect_probe_duration_ms()
            .times(1)
            .returning(|_| Ok(5500));

        let svc = service(test_repo().await, engine);
        let video = svc.ingest(upload("a")).await.unwrap();
        assert_eq!(video.duration_ms, 5500);
    }

    #[tokio::test]
    async fn test_ingest_tolerates_probe_failure() {
        let mut engine = MockMediaEngine::new();
        engine.expect_probe_duration_ms().returning(|_| {
            Err(MediaError::InvalidVideo("not a video".to_string()))
        });

        let svc = service(test_repo().await, engine);
        let video = svc.ingest(upload("broken")).await.unwrap();
        assert_eq!(video.duration_ms, 0);
    }

    #[tokio::test]
    async fn test_trim_unknown_id_is_not_found() {
        let svc = service(test_repo().await, MockMediaEngine::new());
        let err = svc.trim(&VideoId::new(), 5.0, 15.0).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_trim_creates_distinct_video_with_lineage_name() {
        let repo = test_repo().await;

        let mut engine = MockMediaEngine::new();
        engine.expect_probe_duration_ms().returning(|_| Ok(10_000));
        engine
            .expect_trim()
            .times(1)
            .withf(|input, _output, start, duration| {
                input.ends_with("a.stored.mp4")
                    && (*start - 5.0).abs() < f64::EPSILON
                    && (*duration - 10.0).abs() < f64::EPSILON
            })
            .returning(|_, _, _, _| Ok(()));

        let svc = service(repo, engine);
        let source = svc.ingest(upload("a")).await.unwrap();

        let trimmed = svc.trim(&source.id, 5.0, 15.0).await.unwrap();
        assert_ne!(trimmed.id, source.id);
        assert_eq!(trimmed.original_filename, "trimmed_a.mp4");
        assert_eq!(trimmed.size_bytes, 0);
        // Duration probed from the trimmed output, not inherited.
        assert_eq!(trimmed.duration_ms, 10_000);
    }

    #[tokio::test]
    async fn test_trim_engine_failure_propagates_and_leaves_no_row() {
        let repo = test_repo().await;

        let mut engine = MockMediaEngine::new();
        engine.expect_probe_duration_ms().returning(|_| Ok(1000));
        engine
            .expect_trim()
            .returning(|_, _, _, _| Err(MediaError::ffmpeg_failed("boom", None, Some(1))));

        let svc = service(repo.clone(), engine);
        let source = svc.ingest(upload("a")).await.unwrap();

        let err = svc.trim(&source.id, 1.0, 2.0).await.unwrap_err();
        assert!(matches!(err, ApiError::Media(_)));

        // Only the source row exists.
        let rows = repo.find_by_ids(&[source.id.clone()]).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_merge_requires_two_ids() {
        let svc = service(test_repo().await, MockMediaEngine::new());

        let err = svc.merge(&[]).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = svc.merge(&[VideoId::new()]).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_merge_names_every_missing_id() {
        let repo = test_repo().await;

        let mut engine = MockMediaEngine::new();
        engine.expect_probe_duration_ms().returning(|_| Ok(1000));

        let svc = service(repo, engine);
        let existing = svc.ingest(upload("a")).await.unwrap();

        let ghost1 = VideoId::new();
        let ghost2 = VideoId::new();
        let err = svc
            .merge(&[existing.id.clone(), ghost1.clone(), ghost2.clone()])
            .await
            .unwrap_err();

        match err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains(ghost1.as_str()));
                assert!(msg.contains(ghost2.as_str()));
                assert!(!msg.contains(existing.id.as_str()));
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_merge_preserves_caller_order() {
        let repo = test_repo().await;

        let mut engine = MockMediaEngine::new();
        engine.expect_probe_duration_ms().returning(|_| Ok(1000));
        engine
            .expect_merge()
            .times(1)
            .withf(|inputs, _output| {
                inputs.len() == 2
                    && inputs[0].ends_with("b.stored.mp4")
                    && inputs[1].ends_with("a.stored.mp4")
            })
            .returning(|_, _| Ok(()));

        let svc = service(repo, engine);
        let a = svc.ingest(upload("a")).await.unwrap();
        let b = svc.ingest(upload("b")).await.unwrap();

        // Request [b, a]; the engine must see [b, a] even though the
        // batch fetch may return rows in any order.
        let merged = svc.merge(&[b.id.clone(), a.id.clone()]).await.unwrap();
        assert_eq!(merged.original_filename, "merged_video.mp4");
        assert_eq!(merged.size_bytes, 0);
    }

    #[tokio::test]
    async fn test_share_link_roundtrip() {
        let repo = test_repo().await;

        let mut engine = MockMediaEngine::new();
        engine.expect_probe_duration_ms().returning(|_| Ok(1000));

        // Back the row with a real file so resolving can open it.
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("a.stored.mp4");
        std::fs::write(&file_path, b"fake video bytes").unwrap();

        let svc = service(repo, engine);
        let video = svc
            .ingest(NewUpload {
                filename: "a.stored.mp4".to_string(),
                original_filename: "a.mp4".to_string(),
                path: file_path.to_string_lossy().into_owned(),
                size_bytes: 16,
            })
            .await
            .unwrap();

        let shared = svc.issue_share_link(&video.id).await.unwrap();
        let token = shared.share_token.clone().unwrap();
        assert_eq!(token.len(), 32);
        assert!(shared.share_expiry_ms.unwrap() > now_ms());

        let (resolved, _stream) = svc.resolve_shared_stream(&token).await.unwrap();
        assert_eq!(resolved.id, video.id);
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let svc = service(test_repo().await, MockMediaEngine::new());
        let err = svc.resolve_shared_stream("deadbeef").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let repo = test_repo().await;

        let mut engine = MockMediaEngine::new();
        engine.expect_probe_duration_ms().returning(|_| Ok(1000));

        let svc = service(repo.clone(), engine);
        let video = svc.ingest(upload("a")).await.unwrap();

        // Force an expiry in the past.
        let expired = video.with_share("expiredtoken".to_string(), now_ms() - 1000);
        repo.update(&expired).await.unwrap();

        let err = svc.resolve_shared_stream("expiredtoken").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_reissue_invalidates_previous_token() {
        let repo = test_repo().await;

        let mut engine = MockMediaEngine::new();
        engine.expect_probe_duration_ms().returning(|_| Ok(1000));

        let svc = service(repo, engine);
        let video = svc.ingest(upload("a")).await.unwrap();

        let first = svc.issue_share_link(&video.id).await.unwrap();
        let first_token = first.share_token.clone().unwrap();

        let second = svc.issue_share_link(&video.id).await.unwrap();
        let second_token = second.share_token.clone().unwrap();
        assert_ne!(first_token, second_token);

        let err = svc.resolve_shared_stream(&first_token).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duration_limit_check() {
        let mut engine = MockMediaEngine::new();
        engine
            .expect_probe_duration_ms()
            .with(predicate::always())
            .returning(|_| Ok(31_000));

        let svc = service(test_repo().await, engine);
        assert!(!svc.duration_within_limit(Path::new("x.mp4"), 30).await);

        let mut engine = MockMediaEngine::new();
        engine.expect_probe_duration_ms().returning(|_| Ok(29_000));
        let svc = service(test_repo().await, engine);
        assert!(svc.duration_within_limit(Path::new("x.mp4"), 30).await);

        // Probe failure passes validation.
        let mut engine = MockMediaEngine::new();
        engine
            .expect_probe_duration_ms()
            .returning(|_| Err(MediaError::InvalidVideo("bad".to_string())));
        let svc = service(test_repo().await, engine);
        assert!(svc.duration_within_limit(Path::new("x.mp4"), 30).await);
    }
}
