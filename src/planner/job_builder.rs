//! Per-clip job construction
//!
//! A regular clip becomes `resize → overlay? → fade-in → fade-out?`, an empty
//! clip `synthesize(+overlay) → fade-in → fade-out?`. Every job reads only the
//! artifact of the job before it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::filter_graph::{
    FadeDirection, FadeStart, Filter, FilterGraph, StreamRef,
};
use crate::domain::layout::{self, Axis};
use crate::domain::model::*;
use crate::domain::rules::RenderSettings;

/// Path of the artifact named `stem` in the working directory
pub fn artifact_path(work_dir: &Path, stem: &str) -> PathBuf {
    work_dir.join(format!("{}.mp4", stem))
}

/// Draw each line of `overlay` as its own chained draw-text node
pub fn draw_overlay(graph: &mut FilterGraph, input: StreamRef, overlay: &Overlay) -> StreamRef {
    let lines = overlay.lines();
    let total = lines.len();
    let style = overlay.config.font.to_style();
    let anchor = overlay.config.anchor;

    lines
        .into_iter()
        .enumerate()
        .fold(input, |current, (index, line)| {
            graph
                .chain(
                    current,
                    Filter::DrawText {
                        text: line.to_string(),
                        style: style.clone(),
                        x: layout::position(anchor, Axis::X, index, total, style.size),
                        y: layout::position(anchor, Axis::Y, index, total, style.size),
                    },
                )
                .into()
        })
}

/// Black video plus silent stereo audio of `duration` seconds
pub fn synthesized_inputs(frame: FrameSize, fps: u32, duration: f64) -> Vec<JobInput> {
    vec![
        JobInput::Generated {
            graph: format!("color=c=black:s={}:r={}:d={}", frame, fps, duration),
            duration,
        },
        JobInput::silence(duration),
    ]
}

/// Accumulates the jobs of one chain, wiring each to its predecessor
pub(crate) struct ChainWriter<'a> {
    work_dir: &'a Path,
    jobs: Vec<EncodeJob>,
}

impl<'a> ChainWriter<'a> {
    pub(crate) fn new(work_dir: &'a Path) -> Self {
        Self {
            work_dir,
            jobs: Vec::new(),
        }
    }

    /// Output of the most recent job
    pub(crate) fn current(&self) -> Option<&Path> {
        self.jobs.last().map(|job| job.output.as_path())
    }

    fn expected_duration(&self) -> Option<f64> {
        self.jobs.last().and_then(|job| job.expected_duration)
    }

    pub(crate) fn push(
        &mut self,
        stem: String,
        kind: JobKind,
        inputs: Vec<JobInput>,
        graph: FilterGraph,
        maps: Vec<StreamRef>,
        audio: AudioHandling,
        expected_duration: Option<f64>,
    ) {
        let depends_on: BTreeSet<JobId> =
            self.jobs.last().map(|job| job.id.clone()).into_iter().collect();
        self.jobs.push(EncodeJob {
            output: artifact_path(self.work_dir, &stem),
            id: JobId::new(stem),
            kind,
            inputs,
            graph,
            maps,
            audio,
            depends_on,
            expected_duration,
        });
    }

    /// Single-filter job reading the previous artifact, audio copied
    pub(crate) fn push_video_filter(&mut self, stem: String, kind: JobKind, filter: Filter) {
        let input = match self.current() {
            Some(path) => path.to_path_buf(),
            None => return,
        };
        let mut graph = FilterGraph::new();
        let out = graph.chain(StreamRef::video(0), filter);
        let expected = self.expected_duration();
        self.push(
            stem,
            kind,
            vec![JobInput::Artifact(input)],
            graph,
            vec![out.into(), StreamRef::maybe_audio(0)],
            AudioHandling::Copy,
            expected,
        );
    }

    pub(crate) fn finish(self) -> Vec<EncodeJob> {
        self.jobs
    }
}

/// Translates clips into ordered job lists
#[derive(Debug, Clone)]
pub struct JobBuilder {
    settings: RenderSettings,
}

impl JobBuilder {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Artifact stem prefix of clip `index`
    pub fn clip_stem(index: usize, clip: &ClipSpec) -> String {
        match clip {
            ClipSpec::Regular { .. } => format!("clip{}", index),
            ClipSpec::Empty { .. } => format!("empty{}", index),
        }
    }

    /// Ordered jobs for one clip
    pub fn build(&self, index: usize, clip: &ClipSpec, position: ClipPosition) -> Vec<EncodeJob> {
        let stem = Self::clip_stem(index, clip);
        let mut chain = ChainWriter::new(&self.settings.work_dir);

        debug!(
            clip = index,
            first = position.is_first,
            last = position.is_last,
            "Building jobs for {}",
            stem
        );

        match clip {
            ClipSpec::Regular {
                source,
                begin,
                end,
                overlay,
            } => {
                self.push_resize(&mut chain, &stem, source, *begin, *end, clip.known_duration());
                if let Some(overlay) = overlay {
                    self.push_overlay(&mut chain, &stem, overlay);
                }
            }
            ClipSpec::Empty { duration, overlay } => {
                self.push_synthesized(&mut chain, &stem, *duration, overlay.as_ref());
            }
        }

        self.push_fades(&mut chain, &stem, position);
        chain.finish()
    }

    fn push_resize(
        &self,
        chain: &mut ChainWriter<'_>,
        stem: &str,
        source: &Path,
        begin: Option<f64>,
        end: Option<f64>,
        expected: Option<f64>,
    ) {
        let frame = self.settings.frame;
        let mut graph = FilterGraph::new();
        let scaled = graph.chain(
            StreamRef::video(0),
            Filter::ScaleToFit {
                width: frame.width,
                height: frame.height,
            },
        );
        let padded = graph.chain(
            scaled,
            Filter::Pad {
                width: frame.width,
                height: frame.height,
                color: "black".to_string(),
            },
        );
        let square = graph.chain(padded, Filter::SetSar);
        let out = graph.chain(
            square,
            Filter::Fps {
                rate: self.settings.fps,
            },
        );

        chain.push(
            format!("{}.resized", stem),
            JobKind::Resize,
            vec![JobInput::Source {
                path: source.to_path_buf(),
                begin,
                end,
            }],
            graph,
            vec![out.into(), StreamRef::maybe_audio(0)],
            AudioHandling::Copy,
            expected,
        );
    }

    fn push_overlay(&self, chain: &mut ChainWriter<'_>, stem: &str, overlay: &Overlay) {
        let input = match chain.current() {
            Some(path) => path.to_path_buf(),
            None => return,
        };
        let mut graph = FilterGraph::new();
        let out = draw_overlay(&mut graph, StreamRef::video(0), overlay);
        let expected = chain.expected_duration();
        chain.push(
            format!("{}.overlay", stem),
            JobKind::Overlay,
            vec![JobInput::Artifact(input)],
            graph,
            vec![out, StreamRef::maybe_audio(0)],
            AudioHandling::Copy,
            expected,
        );
    }

    fn push_synthesized(
        &self,
        chain: &mut ChainWriter<'_>,
        stem: &str,
        duration: f64,
        overlay: Option<&Overlay>,
    ) {
        let mut graph = FilterGraph::new();
        let video = match overlay {
            Some(overlay) => draw_overlay(&mut graph, StreamRef::video(0), overlay),
            None => StreamRef::video(0),
        };
        chain.push(
            stem.to_string(),
            JobKind::Synthesize,
            synthesized_inputs(self.settings.frame, self.settings.fps, duration),
            graph,
            vec![video, StreamRef::audio(1)],
            AudioHandling::Encode,
            Some(duration),
        );
    }

    fn push_fades(&self, chain: &mut ChainWriter<'_>, stem: &str, position: ClipPosition) {
        let half = self.settings.half_fade();
        let color = self.settings.fade_color.clone();

        chain.push_video_filter(
            format!("{}.fadeIn", stem),
            JobKind::FadeIn,
            Filter::Fade {
                direction: FadeDirection::In,
                start: FadeStart::At(0.0),
                duration: half,
                color: color.clone(),
            },
        );

        if !position.is_last {
            chain.push_video_filter(
                format!("{}.fadeOut", stem),
                JobKind::FadeOut,
                Filter::Fade {
                    direction: FadeDirection::Out,
                    start: FadeStart::BeforeEnd,
                    duration: half,
                    color,
                },
            );
        }
    }
}
