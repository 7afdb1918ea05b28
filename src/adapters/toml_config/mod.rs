// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapters::exec_ffmpeg::EncodingSettings;
use crate::domain::errors::*;
use crate::domain::model::FrameSize;
use crate::domain::report::{CaptionLayout, ClipEntry, ReportKind, ReportLayout, TitleLayout};
use crate::domain::rules::{RenderSettings, SettingsRules};
use crate::utils::logging::LoggingSettings;

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "matchreel.toml";

/// `[output]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub work_dir: PathBuf,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Full crossfade length in seconds
    pub crossfade: f64,
    pub fade_color: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        let settings = RenderSettings::default();
        Self {
            work_dir: settings.work_dir,
            file_name: settings.output_name,
            width: settings.frame.width,
            height: settings.frame.height,
            fps: settings.fps,
            crossfade: settings.crossfade,
            fade_color: settings.fade_color,
        }
    }
}

/// `[pipeline]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Clip chains encoded at the same time
    pub workers: usize,
    /// Keep intermediates after a successful run
    pub keep_intermediates: bool,
    /// Keep artifacts of an aborted run
    pub keep_on_failure: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            keep_intermediates: false,
            keep_on_failure: true,
        }
    }
}

/// `[engine]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

/// `[source]`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Directory holding `<match_id>.json` files
    pub dir: PathBuf,
    pub match_id: String,
    pub shooter_id: String,
}

/// `[report]`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub kind: ReportKind,
}

/// Whole configuration file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    pub output: OutputSection,
    pub encoding: EncodingSettings,
    pub pipeline: PipelineSection,
    pub engine: EngineSection,
    pub logging: LoggingSettings,
    pub source: SourceSection,
    pub report: ReportSection,
    pub title: Option<TitleLayout>,
    pub caption: Option<CaptionLayout>,
    pub clips: Vec<ClipEntry>,
}

impl ReelConfig {
    /// Load `path`, or `matchreel.toml` if present, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self, DomainError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|e| {
            DomainError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        debug!(path = %path.display(), "Loaded configuration");
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, DomainError> {
        toml::from_str(content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse TOML config: {}", e)))
    }

    pub fn to_toml(&self) -> Result<String, DomainError> {
        toml::to_string_pretty(self)
            .map_err(|e| DomainError::Configuration(format!("Failed to serialize config: {}", e)))
    }

    /// Apply `MATCHREEL_*` overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), DomainError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("MATCHREEL_WORK_DIR") {
            self.output.work_dir = PathBuf::from(dir);
        }
        if let Some(workers) = lookup("MATCHREEL_WORKERS") {
            self.pipeline.workers = workers.trim().parse().map_err(|_| {
                DomainError::Configuration(format!(
                    "MATCHREEL_WORKERS must be a positive integer, got '{}'",
                    workers
                ))
            })?;
        }
        if let Some(level) = lookup("MATCHREEL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(ffmpeg) = lookup("MATCHREEL_FFMPEG") {
            self.engine.ffmpeg = PathBuf::from(ffmpeg);
        }
        if let Some(ffprobe) = lookup("MATCHREEL_FFPROBE") {
            self.engine.ffprobe = PathBuf::from(ffprobe);
        }
        Ok(())
    }

    /// Settings shared by every job
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            frame: FrameSize::new(self.output.width, self.output.height),
            fps: self.output.fps,
            crossfade: self.output.crossfade,
            fade_color: self.output.fade_color.clone(),
            work_dir: self.output.work_dir.clone(),
            output_name: self.output.file_name.clone(),
        }
    }

    pub fn layout(&self) -> ReportLayout {
        ReportLayout {
            kind: self.report.kind,
            title: self.title.clone(),
            caption: self.caption.clone(),
            clips: self.clips.clone(),
        }
    }

    /// Checks that do not need the match data
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.pipeline.workers == 0 {
            return Err(DomainError::Configuration(
                "pipeline.workers must be at least 1".to_string(),
            ));
        }
        if self.encoding.crf > 51 {
            return Err(DomainError::Configuration(
                "CRF value cannot exceed 51".to_string(),
            ));
        }
        SettingsRules::validate(&self.render_settings())?;
        self.layout().active_title()?;
        Ok(())
    }
}
