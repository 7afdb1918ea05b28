// Domain rules - Validation applied before any job is submitted

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::report::{ClipDraft, TitleLayout};

#[cfg(test)]
mod tests;

/// Frame, timing and working-file settings shared by every job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub frame: FrameSize,
    pub fps: u32,
    /// Full crossfade length; each side of a boundary fades for half of it
    pub crossfade: f64,
    pub fade_color: String,
    pub work_dir: PathBuf,
    pub output_name: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            frame: FrameSize::new(1920, 1080),
            fps: 30,
            crossfade: 1.0,
            fade_color: "white".to_string(),
            work_dir: PathBuf::from("work"),
            output_name: "report.mp4".to_string(),
        }
    }
}

impl RenderSettings {
    /// Length of one fade-in or fade-out
    pub fn half_fade(&self) -> f64 {
        self.crossfade / 2.0
    }

    pub fn output_path(&self) -> PathBuf {
        self.work_dir.join(&self.output_name)
    }
}

/// Business rules for render settings
pub struct SettingsRules;

impl SettingsRules {
    pub fn validate(settings: &RenderSettings) -> Result<(), DomainError> {
        Self::validate_frame(settings.frame)?;
        if settings.fps == 0 {
            return Err(DomainError::Configuration(
                "Frame rate must be positive".to_string(),
            ));
        }
        if !(settings.crossfade.is_finite() && settings.crossfade >= 0.0) {
            return Err(DomainError::Configuration(format!(
                "Crossfade must be a non-negative number of seconds, got {}",
                settings.crossfade
            )));
        }
        if settings.output_name.trim().is_empty() {
            return Err(DomainError::Configuration(
                "Output file name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Encoders need even dimensions for 4:2:0 output
    pub fn validate_frame(frame: FrameSize) -> Result<(), DomainError> {
        if frame.width == 0 || frame.height == 0 {
            return Err(DomainError::Configuration(
                "Frame dimensions cannot be zero".to_string(),
            ));
        }
        if frame.width % 2 != 0 || frame.height % 2 != 0 {
            return Err(DomainError::Configuration(format!(
                "Frame dimensions must be even, got {}",
                frame
            )));
        }
        Ok(())
    }
}

/// Business rules for clips and the title card
pub struct ClipRules;

impl ClipRules {
    pub fn validate_clip(index: usize, clip: &ClipSpec) -> Result<(), DomainError> {
        let fail = |message: String| {
            Err(DomainError::Configuration(format!("clip {}: {}", index, message)))
        };
        match clip {
            ClipSpec::Regular {
                source, begin, end, ..
            } => {
                if source.as_os_str().is_empty() {
                    return fail("source path cannot be empty".to_string());
                }
                if let (Some(begin), Some(end)) = (begin, end) {
                    if begin >= end {
                        return fail(format!("begin ({}) must be before end ({})", begin, end));
                    }
                }
            }
            ClipSpec::Empty { duration, .. } => {
                if !(duration.is_finite() && *duration > 0.0) {
                    return fail(format!("empty clip duration must be positive, got {}", duration));
                }
            }
        }
        if let Some(overlay) = clip.overlay() {
            if let Err(DomainError::Configuration(message)) = Self::validate_overlay(overlay) {
                return fail(message);
            }
        }
        Ok(())
    }

    pub fn validate_overlay(overlay: &Overlay) -> Result<(), DomainError> {
        if overlay.config.font.size == 0 {
            return Err(DomainError::Configuration(
                "Font size must be positive".to_string(),
            ));
        }
        if overlay.config.font.name.trim().is_empty() && overlay.config.font.path.is_none() {
            return Err(DomainError::Configuration(
                "Font needs a name or a path".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_drafts(drafts: &[ClipDraft]) -> Result<(), DomainError> {
        drafts
            .iter()
            .enumerate()
            .try_for_each(|(index, draft)| Self::validate_clip(index, &draft.clip))
    }

    pub fn validate_title(title: &TitleLayout, settings: &RenderSettings) -> Result<(), DomainError> {
        if !(title.duration.is_finite() && title.duration > 0.0) {
            return Err(DomainError::Configuration(format!(
                "Title duration must be positive, got {}",
                title.duration
            )));
        }
        if title.duration < settings.half_fade() {
            return Err(DomainError::Configuration(format!(
                "Title duration {} is shorter than its fade-out {}",
                title.duration,
                settings.half_fade()
            )));
        }
        if let Some(frame) = title.frame {
            SettingsRules::validate_frame(frame)?;
        }
        Ok(())
    }
}
