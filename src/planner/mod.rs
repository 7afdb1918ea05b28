//! Job planning
//!
//! Turns the clip list and optional title card into independent chains of
//! encode jobs plus the merge job that joins their terminal artifacts.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::errors::DomainError;
use crate::domain::model::{ClipPosition, ClipSpec, EncodeJob};
use crate::domain::rules::{ClipRules, RenderSettings, SettingsRules};

pub mod job_builder;
pub mod merge;
pub mod title;

pub use job_builder::JobBuilder;
pub use merge::{build_merge, MergeSegment};
pub use title::TitleCard;

/// Jobs that must run one after another
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobChain {
    pub label: String,
    pub jobs: Vec<EncodeJob>,
}

impl JobChain {
    /// Job whose artifact enters the merge
    pub fn terminal(&self) -> Option<&EncodeJob> {
        self.jobs.last()
    }

    pub fn is_title(&self) -> bool {
        self.label == "title"
    }
}

/// Complete job graph of one report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelinePlan {
    pub chains: Vec<JobChain>,
    pub merge: EncodeJob,
}

impl PipelinePlan {
    pub fn title(&self) -> Option<&JobChain> {
        self.chains.iter().find(|chain| chain.is_title())
    }

    pub fn clip_chains(&self) -> impl Iterator<Item = &JobChain> {
        self.chains.iter().filter(|chain| !chain.is_title())
    }

    /// Every job, merge last
    pub fn jobs(&self) -> impl Iterator<Item = &EncodeJob> {
        self.chains
            .iter()
            .flat_map(|chain| chain.jobs.iter())
            .chain(std::iter::once(&self.merge))
    }

    pub fn job_count(&self) -> usize {
        self.chains.iter().map(|chain| chain.jobs.len()).sum::<usize>() + 1
    }

    /// Artifacts concatenated by the merge, title first
    pub fn merge_list(&self) -> Vec<&Path> {
        self.chains
            .iter()
            .filter_map(JobChain::terminal)
            .map(|job| job.output.as_path())
            .collect()
    }

    /// Every intermediate file the plan will produce
    pub fn intermediates(&self) -> Vec<PathBuf> {
        self.chains
            .iter()
            .flat_map(|chain| chain.jobs.iter().map(|job| job.output.clone()))
            .collect()
    }
}

/// Validate inputs and build the full plan
pub fn plan_pipeline(
    settings: &RenderSettings,
    clips: &[ClipSpec],
    title: Option<&TitleCard>,
) -> Result<PipelinePlan, DomainError> {
    SettingsRules::validate(settings)?;
    if clips.is_empty() {
        return Err(DomainError::Configuration(
            "At least one clip is required".to_string(),
        ));
    }
    for (index, clip) in clips.iter().enumerate() {
        ClipRules::validate_clip(index, clip)?;
    }

    let mut chains = Vec::with_capacity(clips.len() + 1);
    if let Some(title) = title {
        if !(title.duration.is_finite() && title.duration > 0.0) {
            return Err(DomainError::Configuration(format!(
                "Title duration must be positive, got {}",
                title.duration
            )));
        }
        chains.push(JobChain {
            label: "title".to_string(),
            jobs: title.build(settings),
        });
    }

    let builder = JobBuilder::new(settings.clone());
    for (index, clip) in clips.iter().enumerate() {
        chains.push(JobChain {
            label: JobBuilder::clip_stem(index, clip),
            jobs: builder.build(index, clip, ClipPosition::of(index, clips.len())),
        });
    }

    let segments: Vec<MergeSegment> = chains
        .iter()
        .filter_map(JobChain::terminal)
        .map(|job| MergeSegment {
            path: job.output.clone(),
            producer: job.id.clone(),
            duration: job.expected_duration,
        })
        .collect();
    let merge = build_merge(&segments, settings);

    Ok(PipelinePlan { chains, merge })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::Anchor;
    use crate::domain::model::*;

    fn title() -> TitleCard {
        TitleCard {
            text: "Title".to_string(),
            duration: 4.0,
            overlay: OverlayConfig {
                font: FontSpec {
                    name: "Arial".to_string(),
                    path: None,
                    size: 50,
                    color: "white".to_string(),
                },
                anchor: Anchor::MiddleTop,
            },
            frame: None,
        }
    }

    #[test]
    fn test_two_clips_no_title() {
        let settings = RenderSettings {
            work_dir: PathBuf::from("/w"),
            ..Default::default()
        };
        let clips = vec![ClipSpec::regular("a.mp4"), ClipSpec::regular("b.mp4")];
        let plan = plan_pipeline(&settings, &clips, None).unwrap();

        assert_eq!(plan.chains.len(), 2);
        assert_eq!(plan.chains[0].jobs.len(), 3);
        assert_eq!(plan.chains[1].jobs.len(), 2);
        assert_eq!(plan.job_count(), 6);
        assert_eq!(
            plan.merge_list(),
            vec![Path::new("/w/clip0.fadeOut.mp4"), Path::new("/w/clip1.fadeIn.mp4")]
        );
        assert!(plan.merge.depends_on.contains(&JobId::new("clip1.fadeIn")));
    }

    #[test]
    fn test_title_is_prepended() {
        let clips = vec![ClipSpec::empty(2.0)];
        let plan = plan_pipeline(&RenderSettings::default(), &clips, Some(&title())).unwrap();
        assert!(plan.chains[0].is_title());
        assert_eq!(plan.title().map(|chain| chain.jobs.len()), Some(2));
        assert_eq!(plan.clip_chains().count(), 1);
        assert!(plan.merge_list()[0].ends_with("title.fadeOut.mp4"));
        assert_eq!(plan.merge.expected_duration, Some(6.0));
    }

    #[test]
    fn test_invalid_inputs_rejected_before_planning() {
        let settings = RenderSettings::default();
        assert!(plan_pipeline(&settings, &[], None).is_err());

        let clips = vec![ClipSpec::regular("a.mp4").with_range(Some(3.0), Some(1.0))];
        let err = plan_pipeline(&settings, &clips, None).unwrap_err();
        assert!(err.is_pre_flight());
    }
}
