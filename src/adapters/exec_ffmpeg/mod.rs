//! FFmpeg execution adapter
//!
//! Every job is one `ffmpeg` child process. Machine-readable progress is read
//! from stdout (`-progress pipe:1`); stderr is drained concurrently so a full
//! pipe can never stall the engine, and is kept for the error report.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::domain::errors::*;
use crate::domain::filter_graph::format_seconds;
use crate::domain::model::*;
use crate::ports::*;

/// Number of stderr lines kept in a failure message
const STDERR_TAIL_LINES: usize = 20;

/// Encoder options applied to every job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingSettings {
    pub video_codec: String,
    pub preset: String,
    pub crf: u8,
    pub pixel_format: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "medium".to_string(),
            crf: 18,
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// FFmpeg-based execution adapter
#[derive(Debug, Clone)]
pub struct FFmpegAdapter {
    binary: PathBuf,
    encoding: EncodingSettings,
}

impl FFmpegAdapter {
    pub fn new(binary: impl Into<PathBuf>, encoding: EncodingSettings) -> Self {
        Self {
            binary: binary.into(),
            encoding,
        }
    }

    /// Full argument list for `job`, output path last
    pub fn build_args(&self, job: &EncodeJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-nostats",
            "-progress",
            "pipe:1",
        ]
        .iter()
        .map(OsString::from)
        .collect();

        let mut generated = false;
        for input in &job.inputs {
            match input {
                JobInput::Source { path, begin, end } => {
                    if let Some(begin) = begin {
                        args.push("-ss".into());
                        args.push(format_seconds(*begin).into());
                    }
                    if let Some(end) = end {
                        args.push("-to".into());
                        args.push(format_seconds(*end).into());
                    }
                    args.push("-i".into());
                    args.push(path.into());
                }
                JobInput::Artifact(path) => {
                    args.push("-i".into());
                    args.push(path.into());
                }
                JobInput::Generated { graph, duration } => {
                    generated = true;
                    args.push("-f".into());
                    args.push("lavfi".into());
                    args.push("-t".into());
                    args.push(format_seconds(*duration).into());
                    args.push("-i".into());
                    args.push(graph.into());
                }
            }
        }

        if !job.graph.is_empty() {
            args.push("-filter_complex".into());
            args.push(job.graph.render().into());
        }
        for map in &job.maps {
            args.push("-map".into());
            args.push(map.as_map().into());
        }

        let encoding = &self.encoding;
        for (flag, value) in [
            ("-c:v", encoding.video_codec.as_str()),
            ("-preset", encoding.preset.as_str()),
            ("-pix_fmt", encoding.pixel_format.as_str()),
        ] {
            args.push(flag.into());
            args.push(value.into());
        }
        args.push("-crf".into());
        args.push(encoding.crf.to_string().into());

        match job.audio {
            AudioHandling::Copy => {
                args.push("-c:a".into());
                args.push("copy".into());
            }
            AudioHandling::Encode => {
                args.push("-c:a".into());
                args.push(encoding.audio_codec.as_str().into());
                args.push("-b:a".into());
                args.push(encoding.audio_bitrate.as_str().into());
            }
        }
        if generated {
            args.push("-shortest".into());
        }

        args.push(job.output.as_os_str().to_os_string());
        args
    }

    fn failure(job: &EncodeJob, message: impl Into<String>) -> DomainError {
        DomainError::TranscodeJob {
            job: job.id.to_string(),
            stage: job.kind.to_string(),
            message: message.into(),
        }
    }

    fn cancelled(job: &EncodeJob) -> DomainError {
        DomainError::Cancelled(job.id.to_string())
    }
}

#[async_trait]
impl TranscodePort for FFmpegAdapter {
    async fn submit(
        &self,
        job: &EncodeJob,
        progress: mpsc::UnboundedSender<JobProgress>,
        cancel: CancellationToken,
    ) -> Result<PathBuf, DomainError> {
        if cancel.is_cancelled() {
            return Err(Self::cancelled(job));
        }

        let args = self.build_args(job);
        debug!(job = %job.id, stage = %job.kind, "Running {} {:?}", self.binary.display(), args);

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Self::failure(
                    job,
                    format!("failed to start {}: {}", self.binary.display(), e),
                )
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Self::failure(job, "failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Self::failure(job, "failed to capture ffmpeg stderr"))?;

        let stderr_task = tokio::spawn(async move {
            let mut output = String::new();
            let mut reader = BufReader::new(stderr);
            if let Err(err) = reader.read_to_string(&mut output).await {
                output.push_str(&format!("<failed to read ffmpeg stderr: {}>", err));
            }
            output
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut state = ProgressState::default();
        let mut reported = 0.0f32;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let _ = child.kill().await;
                    stderr_task.abort();
                    return Err(Self::cancelled(job));
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let Some((key, value)) = line.split_once('=') else {
                            continue;
                        };
                        if state.update(key.trim(), value.trim()) {
                            // never report a lower value than before
                            reported = state.percent(job.expected_duration).max(reported);
                            trace!(job = %job.id, percent = reported, frames = state.frames, "progress");
                            let _ = progress.send(JobProgress {
                                percent: reported,
                                frames: state.frames,
                            });
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        warn!(job = %job.id, "Failed reading ffmpeg progress: {}", err);
                        break;
                    }
                },
            }
        }

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                stderr_task.abort();
                return Err(Self::cancelled(job));
            }
            status = child.wait() => status
                .map_err(|e| Self::failure(job, format!("failed waiting for ffmpeg: {}", e)))?,
        };

        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(Self::failure(
                job,
                format!("ffmpeg exited with {}: {}", status, stderr_tail(&stderr_output)),
            ));
        }
        if !job.output.exists() {
            return Err(Self::failure(
                job,
                format!("ffmpeg reported success but {} is missing", job.output.display()),
            ));
        }

        let _ = progress.send(JobProgress {
            percent: 100.0,
            frames: state.frames,
        });
        Ok(job.output.clone())
    }
}

fn stderr_tail(output: &str) -> String {
    let lines: Vec<&str> = output.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = lines[start..].join("\n");
    if tail.is_empty() {
        "<no diagnostic output>".to_string()
    } else {
        tail
    }
}

/// Key/value block accumulated from `-progress` output
#[derive(Debug, Default)]
struct ProgressState {
    out_time_secs: f64,
    frames: u64,
    complete: bool,
}

impl ProgressState {
    /// Apply one line; returns true when a block is complete
    fn update(&mut self, key: &str, value: &str) -> bool {
        match key {
            // out_time_ms carries microseconds too
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<f64>() {
                    self.out_time_secs = us / 1_000_000.0;
                }
                false
            }
            "frame" => {
                if let Ok(frames) = value.parse::<u64>() {
                    self.frames = frames;
                }
                false
            }
            "progress" => {
                self.complete = value == "end";
                true
            }
            _ => false,
        }
    }

    fn percent(&self, expected_duration: Option<f64>) -> f32 {
        if self.complete {
            return 100.0;
        }
        match expected_duration {
            Some(total) if total > 0.0 => {
                ((self.out_time_secs / total) * 100.0).clamp(0.0, 100.0) as f32
            }
            _ => 0.0,
        }
    }
}
