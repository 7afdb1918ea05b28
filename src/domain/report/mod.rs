//! Declarative report layout
//!
//! Clip entries arrive either as a bare path, as a detailed table or as an
//! empty filler. [`ReportLayout::normalize`] turns them into [`ClipDraft`]s
//! once; nothing downstream branches on the raw shape again.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::model::{ClipSpec, FrameSize, OverlayConfig};
use crate::utils::time::parse_offset;

/// Report flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Opens with a title card
    #[default]
    Summary,
    /// Clips only
    Plain,
}

impl ReportKind {
    pub fn requires_title(self) -> bool {
        matches!(self, ReportKind::Summary)
    }
}

/// Title card description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleLayout {
    pub template: String,
    pub duration: f64,
    pub overlay: OverlayConfig,
    /// Defaults to the output frame
    #[serde(default)]
    pub frame: Option<FrameSize>,
}

/// Default caption for clips tied to a stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionLayout {
    #[serde(default)]
    pub template: Option<String>,
    pub overlay: OverlayConfig,
}

/// Offset given as seconds or as a time string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(f64),
    Text(String),
}

impl TimeValue {
    pub fn seconds(&self) -> Result<f64, DomainError> {
        match self {
            TimeValue::Seconds(seconds) if *seconds >= 0.0 => Ok(*seconds),
            TimeValue::Seconds(seconds) => Err(DomainError::Configuration(format!(
                "Negative offset: {}",
                seconds
            ))),
            TimeValue::Text(text) => parse_offset(text),
        }
    }
}

/// Filler clip entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyEntry {
    pub empty: f64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub stage: Option<u32>,
    #[serde(default)]
    pub subtitle: Option<OverlayConfig>,
}

/// Clip entry with options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub begin: Option<TimeValue>,
    #[serde(default)]
    pub end: Option<TimeValue>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub stage: Option<u32>,
    #[serde(default)]
    pub subtitle: Option<OverlayConfig>,
}

/// Clip entry in any accepted shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClipEntry {
    Path(PathBuf),
    Empty(EmptyEntry),
    Detailed(DetailedEntry),
}

/// Clip whose overlay text still has to be rendered
#[derive(Debug, Clone, PartialEq)]
pub struct ClipDraft {
    /// Clip without overlay
    pub clip: ClipSpec,
    pub text_template: Option<String>,
    pub stage: Option<u32>,
    pub overlay: Option<OverlayConfig>,
}

/// Whole layout description
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportLayout {
    #[serde(default)]
    pub kind: ReportKind,
    #[serde(default)]
    pub title: Option<TitleLayout>,
    #[serde(default)]
    pub caption: Option<CaptionLayout>,
    #[serde(default)]
    pub clips: Vec<ClipEntry>,
}

impl ReportLayout {
    /// Title layout when the report kind asks for one
    pub fn active_title(&self) -> Result<Option<&TitleLayout>, DomainError> {
        if !self.kind.requires_title() {
            return Ok(None);
        }
        self.title.as_ref().map(Some).ok_or_else(|| {
            DomainError::Configuration("Summary report requires a [title] section".to_string())
        })
    }

    /// Normalize every clip entry, in input order
    pub fn normalize(&self) -> Result<Vec<ClipDraft>, DomainError> {
        if self.clips.is_empty() {
            return Err(DomainError::Configuration(
                "Layout contains no clips".to_string(),
            ));
        }
        self.clips
            .iter()
            .enumerate()
            .map(|(index, entry)| self.normalize_entry(entry).map_err(|e| at_clip(index, e)))
            .collect()
    }

    fn normalize_entry(&self, entry: &ClipEntry) -> Result<ClipDraft, DomainError> {
        let (clip, text, stage, subtitle) = match entry {
            ClipEntry::Path(path) => (ClipSpec::regular(path.clone()), None, None, None),
            ClipEntry::Empty(empty) => (
                ClipSpec::empty(empty.empty),
                empty.text.clone(),
                empty.stage,
                empty.subtitle.clone(),
            ),
            ClipEntry::Detailed(detailed) => {
                let begin = detailed.begin.as_ref().map(TimeValue::seconds).transpose()?;
                let end = detailed.end.as_ref().map(TimeValue::seconds).transpose()?;
                (
                    ClipSpec::regular(detailed.path.clone()).with_range(begin, end),
                    detailed.text.clone(),
                    detailed.stage,
                    detailed.subtitle.clone(),
                )
            }
        };

        let caption = self.caption.as_ref();
        let text_template = text.or_else(|| {
            stage
                .and(caption)
                .and_then(|caption| caption.template.clone())
        });
        let overlay = subtitle.or_else(|| caption.map(|caption| caption.overlay.clone()));

        if text_template.is_some() && overlay.is_none() {
            return Err(DomainError::Configuration(
                "Overlay text given without a subtitle or [caption] overlay config".to_string(),
            ));
        }

        Ok(ClipDraft {
            clip,
            text_template,
            stage,
            overlay,
        })
    }
}

fn at_clip(index: usize, error: DomainError) -> DomainError {
    match error {
        DomainError::Configuration(message) => {
            DomainError::Configuration(format!("clip {}: {}", index, message))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::layout::Anchor;
    use crate::domain::model::FontSpec;

    fn overlay() -> OverlayConfig {
        OverlayConfig {
            font: FontSpec {
                name: "DejaVu Sans".to_string(),
                path: None,
                size: 32,
                color: "yellow".to_string(),
            },
            anchor: Anchor::LeftBottom,
        }
    }

    #[test]
    fn test_normalize_shapes() {
        let layout = ReportLayout {
            kind: ReportKind::Plain,
            title: None,
            caption: Some(CaptionLayout {
                template: Some("Stage {stage.number}".to_string()),
                overlay: overlay(),
            }),
            clips: vec![
                ClipEntry::Path(PathBuf::from("a.mp4")),
                ClipEntry::Detailed(DetailedEntry {
                    path: PathBuf::from("b.mp4"),
                    begin: Some(TimeValue::Text("0:05".to_string())),
                    end: Some(TimeValue::Seconds(20.0)),
                    text: None,
                    stage: Some(2),
                    subtitle: None,
                }),
                ClipEntry::Empty(EmptyEntry {
                    empty: 2.5,
                    text: Some("Thanks".to_string()),
                    stage: None,
                    subtitle: None,
                }),
            ],
        };

        let drafts = layout.normalize().unwrap();
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].clip, ClipSpec::regular("a.mp4"));
        assert_eq!(drafts[0].text_template, None);
        assert_eq!(
            drafts[1].clip,
            ClipSpec::regular("b.mp4").with_range(Some(5.0), Some(20.0))
        );
        assert_eq!(drafts[1].text_template.as_deref(), Some("Stage {stage.number}"));
        assert_eq!(drafts[1].stage, Some(2));
        assert_eq!(drafts[2].clip, ClipSpec::empty(2.5));
        assert_eq!(drafts[2].overlay, Some(overlay()));
    }

    #[test]
    fn test_text_without_overlay_is_rejected() {
        let layout = ReportLayout {
            clips: vec![ClipEntry::Empty(EmptyEntry {
                empty: 1.0,
                text: Some("hello".to_string()),
                stage: None,
                subtitle: None,
            })],
            ..Default::default()
        };
        let err = layout.normalize().unwrap_err();
        assert!(matches!(err, DomainError::Configuration(ref m) if m.starts_with("clip 0:")));
    }

    #[test]
    fn test_summary_requires_title() {
        let layout = ReportLayout::default();
        assert!(layout.active_title().is_err());
        let plain = ReportLayout {
            kind: ReportKind::Plain,
            ..Default::default()
        };
        assert_eq!(plain.active_title().unwrap(), None);
    }

    #[test]
    fn test_deserialize_mixed_clip_entries() {
        let toml_src = r#"
            kind = "plain"

            [[clips]]
            path = "stage1.mp4"
            begin = "00:01:02.5"
            end = 75

            [[clips]]
            empty = 3.0
        "#;
        let layout: ReportLayout = toml::from_str(toml_src).unwrap();
        assert_eq!(layout.kind, ReportKind::Plain);
        assert!(matches!(layout.clips[0], ClipEntry::Detailed(_)));
        assert!(matches!(layout.clips[1], ClipEntry::Empty(_)));

        let drafts = layout.normalize().unwrap();
        assert_eq!(drafts[0].clip.known_duration(), Some(12.5));
    }
}
