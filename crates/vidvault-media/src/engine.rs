//! The transcoding engine seam.
//!
//! [`MediaEngine`] is the stateless contract the lifecycle service talks
//! to: probe a file's duration, trim a segment, concatenate inputs. Each
//! call wraps the external capability fresh, holds no shared handle, and
//! signals completion or failure exactly once.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe;

/// Asynchronous media-processing capability.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Probe the duration of a media file, in milliseconds.
    async fn probe_duration_ms(&self, path: &Path) -> MediaResult<i64>;

    /// Write `duration_secs` of media starting at `start_secs` of `input`
    /// to a new file at `output`. The state of a partially written output
    /// on failure is engine-defined and not cleaned up here.
    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        start_secs: f64,
        duration_secs: f64,
    ) -> MediaResult<()>;

    /// Concatenate `inputs` into `output`, preserving the given order
    /// exactly, with no reordering or deduplication.
    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> MediaResult<()>;
}

/// [`MediaEngine`] backed by the ffmpeg and ffprobe binaries.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEngine;

impl FfmpegEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn probe_duration_ms(&self, path: &Path) -> MediaResult<i64> {
        probe::probe_duration_ms(path).await
    }

    async fn trim(
        &self,
        input: &Path,
        output: &Path,
        start_secs: f64,
        duration_secs: f64,
    ) -> MediaResult<()> {
        info!(
            "Trimming {} -> {} (start: {:.3}s, duration: {:.3}s)",
            input.display(),
            output.display(),
            start_secs,
            duration_secs
        );

        let cmd = FfmpegCommand::new(input, output)
            .seek(start_secs)
            .duration(duration_secs);

        FfmpegRunner::new().run(&cmd).await
    }

    async fn merge(&self, inputs: &[PathBuf], output: &Path) -> MediaResult<()> {
        info!("Merging {} inputs -> {}", inputs.len(), output.display());

        // Callers guard against short lists; an empty one is still an
        // engine failure rather than a panic.
        let Some((first, rest)) = inputs.split_first() else {
            return Err(MediaError::ffmpeg_failed("No inputs to merge", None, None));
        };
        let mut cmd = FfmpegCommand::new(first, output);
        for input in rest {
            cmd = cmd.add_input(input);
        }

        let cmd = cmd
            .filter_complex(concat_filter(inputs.len()))
            .output_args(["-map", "[v]", "-map", "[a]"]);

        FfmpegRunner::new().run(&cmd).await
    }
}

/// Build a concat filter graph for `n` inputs: each input contributes its
/// video and audio stream, in input order.
fn concat_filter(n: usize) -> String {
    let mut filter = String::new();
    for i in 0..n {
        filter.push_str(&format!("[{i}:v][{i}:a]"));
    }
    filter.push_str(&format!("concat=n={n}:v=1:a=1[v][a]"));
    filter
}
