//! Final concatenation job

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::domain::filter_graph::{Filter, FilterGraph, StreamKind, StreamRef};
use crate::domain::model::*;
use crate::domain::rules::RenderSettings;

/// Segment handed to the merge, in timeline order
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSegment {
    pub path: PathBuf,
    pub producer: JobId,
    pub duration: Option<f64>,
}

/// Concatenate every segment's video and audio into the output file
pub fn build_merge(segments: &[MergeSegment], settings: &RenderSettings) -> EncodeJob {
    let mut graph = FilterGraph::new();
    let pads = (0..segments.len())
        .flat_map(|index| [StreamRef::video(index), StreamRef::audio(index)])
        .collect();
    let outputs = graph.apply(
        pads,
        Filter::Concat {
            segments: segments.len(),
        },
        &[StreamKind::Video, StreamKind::Audio],
    );

    let expected_duration = segments
        .iter()
        .map(|segment| segment.duration)
        .sum::<Option<f64>>();

    EncodeJob {
        id: JobId::new("merge"),
        kind: JobKind::Merge,
        inputs: segments
            .iter()
            .map(|segment| JobInput::Artifact(segment.path.clone()))
            .collect(),
        graph,
        maps: outputs.into_iter().map(StreamRef::from).collect(),
        audio: AudioHandling::Encode,
        output: settings.output_path(),
        depends_on: segments
            .iter()
            .map(|segment| segment.producer.clone())
            .collect::<BTreeSet<_>>(),
        expected_duration,
    }
}
