//! FFprobe adapter for media file probing

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::*;
use crate::ports::*;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FFprobeAdapter {
    binary: PathBuf,
}

impl FFprobeAdapter {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Run ffprobe over `path` with `args` and return its stdout
    async fn query(&self, path: &Path, args: &[&str]) -> Result<String, DomainError> {
        let fail = |message: String| DomainError::Probe {
            path: path.display().to_string(),
            message,
        };

        let output = Command::new(&self.binary)
            .args(["-v", "error"])
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| fail(format!("failed to start {}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            return Err(fail(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn duration(&self, path: &Path) -> Result<f64, DomainError> {
        let raw = self
            .query(
                path,
                &[
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                ],
            )
            .await?;
        let duration = parse_duration(&raw).ok_or_else(|| DomainError::Probe {
            path: path.display().to_string(),
            message: format!("unexpected ffprobe output '{}'", raw.trim()),
        })?;
        debug!(path = %path.display(), duration, "Probed duration");
        Ok(duration)
    }

    async fn has_audio(&self, path: &Path) -> Result<bool, DomainError> {
        let raw = self
            .query(
                path,
                &[
                    "-select_streams",
                    "a",
                    "-show_entries",
                    "stream=codec_type",
                    "-of",
                    "csv=p=0",
                ],
            )
            .await?;
        let audio = lists_audio(&raw);
        debug!(path = %path.display(), audio, "Probed audio streams");
        Ok(audio)
    }
}

fn lists_audio(raw: &str) -> bool {
    raw.lines().any(|line| line.trim() == "audio")
}

fn parse_duration(raw: &str) -> Option<f64> {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .and_then(|line| line.parse::<f64>().ok())
        .filter(|duration| duration.is_finite() && *duration >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("12.480000\n"), Some(12.48));
        assert_eq!(parse_duration("\n  3.5  \n"), Some(3.5));
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_lists_audio() {
        assert!(lists_audio("audio\n"));
        assert!(lists_audio("audio\naudio\n"));
        assert!(!lists_audio(""));
        assert!(!lists_audio("\n"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_probe_error() {
        let adapter = FFprobeAdapter::new("/nonexistent/matchreel-ffprobe");
        let err = adapter.duration(Path::new("clip.mp4")).await.unwrap_err();
        assert!(matches!(err, DomainError::Probe { ref path, .. } if path == "clip.mp4"));

        let err = adapter.has_audio(Path::new("clip.mp4")).await.unwrap_err();
        assert!(matches!(err, DomainError::Probe { .. }));
    }
}
