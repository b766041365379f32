//! FFprobe duration extraction.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
}

/// Probe a media file and return its duration in whole milliseconds.
///
/// Fractional milliseconds are rounded up, so any nonzero duration maps
/// to a nonzero result. Fails on unreadable files and on containers
/// without a video stream or a parseable duration.
pub async fn probe_duration_ms(path: impl AsRef<Path>) -> MediaResult<i64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)?;

    probe
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("video"))
        .then_some(())
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    let seconds = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::InvalidVideo("No duration in container".to_string()))?;

    Ok(duration_to_ms(seconds))
}

/// Convert a duration in seconds to whole milliseconds, rounding up.
fn duration_to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).ceil() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_rounds_up() {
        assert_eq!(duration_to_ms(1.0), 1000);
        assert_eq!(duration_to_ms(1.0001), 1001);
        assert_eq!(duration_to_ms(0.0005), 1);
        assert_eq!(duration_to_ms(0.0), 0);
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = probe_duration_ms("/does/not/exist.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[test]
    fn test_ffprobe_output_parsing() {
        let json = r#"{
            "format": {"duration": "12.345"},
            "streams": [
                {"codec_type": "video"},
                {"codec_type": "audio"}
            ]
        }"#;
        let probe: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert_eq!(probe.format.duration.as_deref(), Some("12.345"));
        assert_eq!(probe.streams.len(), 2);
    }
}
