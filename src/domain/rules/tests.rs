// Unit tests for business rules

use crate::domain::errors::*;
use crate::domain::layout::Anchor;
use crate::domain::model::*;
use crate::domain::report::TitleLayout;
use crate::domain::rules::*;

fn overlay_config(size: u32) -> OverlayConfig {
    OverlayConfig {
        font: FontSpec {
            name: "Arial".to_string(),
            path: None,
            size,
            color: "white".to_string(),
        },
        anchor: Anchor::Center,
    }
}

#[test]
fn test_default_settings_are_valid() {
    let settings = RenderSettings::default();
    assert!(SettingsRules::validate(&settings).is_ok());
    assert_eq!(settings.half_fade(), 0.5);
    assert!(settings.output_path().ends_with("report.mp4"));
}

#[test]
fn test_odd_frame_rejected() {
    let settings = RenderSettings {
        frame: FrameSize::new(1921, 1080),
        ..Default::default()
    };
    assert!(matches!(
        SettingsRules::validate(&settings),
        Err(DomainError::Configuration(_))
    ));
}

#[test]
fn test_zero_fps_and_negative_crossfade_rejected() {
    let zero_fps = RenderSettings {
        fps: 0,
        ..Default::default()
    };
    assert!(SettingsRules::validate(&zero_fps).is_err());

    let negative = RenderSettings {
        crossfade: -1.0,
        ..Default::default()
    };
    assert!(SettingsRules::validate(&negative).is_err());
}

#[test]
fn test_clip_range_rules() {
    let ok = ClipSpec::regular("a.mp4").with_range(Some(1.0), Some(5.0));
    assert!(ClipRules::validate_clip(0, &ok).is_ok());

    let backwards = ClipSpec::regular("a.mp4").with_range(Some(5.0), Some(1.0));
    let err = ClipRules::validate_clip(3, &backwards).unwrap_err();
    assert!(err.to_string().contains("clip 3"));

    assert!(ClipRules::validate_clip(0, &ClipSpec::empty(0.0)).is_err());
    assert!(ClipRules::validate_clip(0, &ClipSpec::regular("")).is_err());
}

#[test]
fn test_overlay_font_rules() {
    let clip = ClipSpec::empty(2.0).with_overlay(Overlay::new("hi", overlay_config(0)));
    assert!(ClipRules::validate_clip(1, &clip).is_err());

    let clip = ClipSpec::empty(2.0).with_overlay(Overlay::new("hi", overlay_config(24)));
    assert!(ClipRules::validate_clip(1, &clip).is_ok());
}

#[test]
fn test_title_rules() {
    let settings = RenderSettings {
        crossfade: 4.0,
        ..Default::default()
    };
    let mut title = TitleLayout {
        template: "{match.title}".to_string(),
        duration: 5.0,
        overlay: overlay_config(60),
        frame: None,
    };
    assert!(ClipRules::validate_title(&title, &settings).is_ok());

    title.duration = 1.0;
    assert!(ClipRules::validate_title(&title, &settings).is_err());

    title.duration = 5.0;
    title.frame = Some(FrameSize::new(0, 720));
    assert!(ClipRules::validate_title(&title, &settings).is_err());
}
