//! Title card jobs

use serde::Serialize;

use crate::domain::filter_graph::{FadeDirection, FadeStart, Filter, FilterGraph, StreamRef};
use crate::domain::model::*;
use crate::domain::rules::RenderSettings;
use crate::planner::job_builder::{draw_overlay, synthesized_inputs, ChainWriter};

/// Title card with its text already rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleCard {
    pub text: String,
    pub duration: f64,
    pub overlay: OverlayConfig,
    /// Frame the card is drawn on; defaults to the output frame
    pub frame: Option<FrameSize>,
}

impl TitleCard {
    /// `title → title.fadeOut`
    ///
    /// The card length is known up front, so its fade-out never needs a probe.
    pub fn build(&self, settings: &RenderSettings) -> Vec<EncodeJob> {
        let frame = self.frame.unwrap_or(settings.frame);
        let mut chain = ChainWriter::new(&settings.work_dir);

        let mut graph = FilterGraph::new();
        let overlay = Overlay::new(self.text.clone(), self.overlay.clone());
        let mut video = draw_overlay(&mut graph, StreamRef::video(0), &overlay);
        if frame != settings.frame {
            let target = settings.frame;
            let scaled = graph.chain(
                video,
                Filter::ScaleToFit {
                    width: target.width,
                    height: target.height,
                },
            );
            let padded = graph.chain(
                scaled,
                Filter::Pad {
                    width: target.width,
                    height: target.height,
                    color: "black".to_string(),
                },
            );
            video = graph.chain(padded, Filter::SetSar).into();
        }

        chain.push(
            "title".to_string(),
            JobKind::Title,
            synthesized_inputs(frame, settings.fps, self.duration),
            graph,
            vec![video, StreamRef::audio(1)],
            AudioHandling::Encode,
            Some(self.duration),
        );

        let half = settings.half_fade();
        chain.push_video_filter(
            "title.fadeOut".to_string(),
            JobKind::FadeOut,
            Filter::Fade {
                direction: FadeDirection::Out,
                start: FadeStart::At((self.duration - half).max(0.0)),
                duration: half,
                color: settings.fade_color.clone(),
            },
        );

        chain.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::Anchor;
    use std::path::PathBuf;

    fn card(frame: Option<FrameSize>) -> TitleCard {
        TitleCard {
            text: "Spring Cup\nJane Doe".to_string(),
            duration: 5.0,
            overlay: OverlayConfig {
                font: FontSpec {
                    name: "Arial".to_string(),
                    path: None,
                    size: 60,
                    color: "white".to_string(),
                },
                anchor: Anchor::Center,
            },
            frame,
        }
    }

    #[test]
    fn test_title_jobs() {
        let settings = RenderSettings {
            work_dir: PathBuf::from("/w"),
            ..Default::default()
        };
        let jobs = card(None).build(&settings);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].kind, JobKind::Title);
        assert_eq!(jobs[0].output, PathBuf::from("/w/title.mp4"));
        assert_eq!(jobs[0].graph.nodes().len(), 2);

        let fade = &jobs[1];
        assert_eq!(fade.needs_probe(), None);
        assert!(fade.graph.render().contains("fade=t=out:st=4.5:d=0.5"));
        assert!(fade.depends_on.contains(&JobId::new("title")));
    }

    #[test]
    fn test_title_on_custom_frame_is_scaled() {
        let settings = RenderSettings::default();
        let jobs = card(Some(FrameSize::new(1280, 720))).build(&settings);
        let rendered = jobs[0].graph.render();
        assert!(rendered.contains("scale=w=1920:h=1080"));
        assert!(matches!(
            &jobs[0].inputs[0],
            JobInput::Generated { graph, .. } if graph.contains("s=1280x720")
        ));
    }
}
