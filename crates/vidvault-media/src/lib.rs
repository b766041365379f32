//! FFmpeg CLI wrapper for VidVault.
//!
//! Exposes the three engine operations the rest of the system needs,
//! probe duration, trim, merge, behind the stateless [`MediaEngine`]
//! trait, with [`FfmpegEngine`] shelling out to ffmpeg/ffprobe.

pub mod command;
pub mod engine;
pub mod error;
pub mod probe;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use engine::{FfmpegEngine, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use probe::probe_duration_ms;

#[cfg(any(test, feature = "mocks"))]
pub use engine::MockMediaEngine;
