// Domain models - Clips, overlays and encode jobs

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::filter_graph::{
    FadeStart, Filter, FilterGraph, StreamKind, StreamRef, TextStyle,
};
use crate::domain::layout::Anchor;


/// Target frame dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Font used for overlay text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub name: String,
    /// Font file; takes precedence over `name` when set
    #[serde(default)]
    pub path: Option<String>,
    pub size: u32,
    pub color: String,
}

impl FontSpec {
    pub fn to_style(&self) -> TextStyle {
        TextStyle {
            font: self.name.clone(),
            font_file: self.path.clone(),
            size: self.size,
            color: self.color.clone(),
        }
    }
}

/// Where and how overlay text is drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    pub font: FontSpec,
    #[serde(alias = "position")]
    pub anchor: Anchor,
}

/// Rendered overlay text together with its placement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlay {
    pub text: String,
    pub config: OverlayConfig,
}

impl Overlay {
    pub fn new(text: impl Into<String>, config: OverlayConfig) -> Self {
        Self {
            text: text.into(),
            config,
        }
    }

    /// Text split on line breaks
    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }
}

/// One timeline-ordered input segment of the report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClipSpec {
    /// Segment cut from a source file
    Regular {
        source: PathBuf,
        begin: Option<f64>,
        end: Option<f64>,
        overlay: Option<Overlay>,
    },
    /// Synthesized black filler with silent audio
    Empty {
        duration: f64,
        overlay: Option<Overlay>,
    },
}

impl ClipSpec {
    pub fn regular(source: impl Into<PathBuf>) -> Self {
        ClipSpec::Regular {
            source: source.into(),
            begin: None,
            end: None,
            overlay: None,
        }
    }

    pub fn empty(duration: f64) -> Self {
        ClipSpec::Empty {
            duration,
            overlay: None,
        }
    }

    pub fn with_overlay(self, overlay: Overlay) -> Self {
        match self {
            ClipSpec::Regular {
                source, begin, end, ..
            } => ClipSpec::Regular {
                source,
                begin,
                end,
                overlay: Some(overlay),
            },
            ClipSpec::Empty { duration, .. } => ClipSpec::Empty {
                duration,
                overlay: Some(overlay),
            },
        }
    }

    pub fn with_range(self, begin: Option<f64>, end: Option<f64>) -> Self {
        match self {
            ClipSpec::Regular {
                source, overlay, ..
            } => ClipSpec::Regular {
                source,
                begin,
                end,
                overlay,
            },
            empty => empty,
        }
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        match self {
            ClipSpec::Regular { overlay, .. } | ClipSpec::Empty { overlay, .. } => {
                overlay.as_ref()
            }
        }
    }

    /// Duration known without probing
    pub fn known_duration(&self) -> Option<f64> {
        match self {
            ClipSpec::Regular {
                begin: Some(begin),
                end: Some(end),
                ..
            } => Some(end - begin),
            ClipSpec::Regular { .. } => None,
            ClipSpec::Empty { duration, .. } => Some(*duration),
        }
    }
}

/// Where a clip sits on the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipPosition {
    pub is_first: bool,
    pub is_last: bool,
}

impl ClipPosition {
    pub fn of(index: usize, count: usize) -> Self {
        Self {
            is_first: index == 0,
            is_last: index + 1 == count,
        }
    }
}

/// Identifier of an encode job, also the stem of its artifact
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sub-stage a job performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JobKind {
    Resize,
    Overlay,
    Synthesize,
    Title,
    FadeIn,
    FadeOut,
    Merge,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobKind::Resize => "resize",
            JobKind::Overlay => "overlay",
            JobKind::Synthesize => "synthesize",
            JobKind::Title => "title",
            JobKind::FadeIn => "fade-in",
            JobKind::FadeOut => "fade-out",
            JobKind::Merge => "merge",
        };
        write!(f, "{}", name)
    }
}

/// Input handed to the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum JobInput {
    /// Source file, optionally trimmed
    Source {
        path: PathBuf,
        begin: Option<f64>,
        end: Option<f64>,
    },
    /// Artifact produced by an earlier job
    Artifact(PathBuf),
    /// Generated source (`color=...`, `anullsrc=...`)
    Generated { graph: String, duration: f64 },
}

/// Sample rate of synthesized silence
pub const SILENCE_SAMPLE_RATE: u32 = 48_000;

impl JobInput {
    /// Silent stereo audio of `duration` seconds
    pub fn silence(duration: f64) -> Self {
        JobInput::Generated {
            graph: format!(
                "anullsrc=channel_layout=stereo:sample_rate={}",
                SILENCE_SAMPLE_RATE
            ),
            duration,
        }
    }
}

/// What the job does with audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AudioHandling {
    Copy,
    Encode,
}

/// One invocation of the external engine
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeJob {
    pub id: JobId,
    pub kind: JobKind,
    pub inputs: Vec<JobInput>,
    pub graph: FilterGraph,
    pub maps: Vec<StreamRef>,
    pub audio: AudioHandling,
    pub output: PathBuf,
    pub depends_on: BTreeSet<JobId>,
    /// Output duration when known, used to turn engine timestamps into percent
    pub expected_duration: Option<f64>,
}

impl EncodeJob {
    /// Artifact to probe before this job can be submitted
    pub fn needs_probe(&self) -> Option<&Path> {
        let unresolved = self.graph.nodes().iter().any(|node| {
            matches!(
                node.filter,
                Filter::Fade {
                    start: FadeStart::BeforeEnd,
                    ..
                }
            )
        });
        if !unresolved {
            return None;
        }
        self.inputs.iter().find_map(|input| match input {
            JobInput::Artifact(path) => Some(path.as_path()),
            _ => None,
        })
    }

    /// Source file whose audio is mapped only if present
    pub fn optional_audio_source(&self) -> Option<&Path> {
        self.maps.iter().find_map(|map| match map {
            StreamRef::Input {
                index,
                kind: StreamKind::Audio,
                optional: true,
            } => match self.inputs.get(*index) {
                Some(JobInput::Source { path, .. }) => Some(path.as_path()),
                _ => None,
            },
            _ => None,
        })
    }

    /// Replace the optional source audio with generated silence.
    ///
    /// The merge concatenates audio of every segment, so each clip chain must
    /// start from a job that outputs an audio stream.
    pub fn fill_silence(&mut self, duration: f64) {
        let index = self.inputs.len();
        self.inputs.push(JobInput::silence(duration));
        for map in &mut self.maps {
            if let StreamRef::Input {
                kind: StreamKind::Audio,
                optional: true,
                ..
            } = map
            {
                *map = StreamRef::audio(index);
            }
        }
        self.audio = AudioHandling::Encode;
    }

    /// Pin end-relative fades to the probed input duration
    pub fn resolve_fades(&mut self, input_duration: f64) {
        for node in self.graph.nodes_mut() {
            if let Filter::Fade {
                start, duration, ..
            } = &mut node.filter
            {
                if *start == FadeStart::BeforeEnd {
                    *start = FadeStart::At((input_duration - *duration).max(0.0));
                }
            }
        }
        if self.expected_duration.is_none() {
            self.expected_duration = Some(input_duration);
        }
    }
}

/// Job lifecycle
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Created,
    Submitted,
    Running { percent: f32 },
    Succeeded(PathBuf),
    Failed(String),
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded(_) | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }
}

/// Progress event emitted while a job runs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JobProgress {
    pub percent: f32,
    pub frames: u64,
}

/// Transient file produced by a job
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    pub producer: JobId,
}
