//! Anchored text placement expressions for draw-text filters

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

/// Margin from the frame edge in pixels
const EDGE_MARGIN: u32 = 15;

/// Inter-line gap as a fraction of the font size
const LINE_GAP_RATIO: f64 = 0.1;

/// Named on-frame text position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    Center,
    LeftTop,
    LeftBottom,
    MiddleTop,
    MiddleBottom,
}

impl FromStr for Anchor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(Anchor::Center),
            "leftTop" => Ok(Anchor::LeftTop),
            "leftBottom" => Ok(Anchor::LeftBottom),
            "middleTop" => Ok(Anchor::MiddleTop),
            "middleBottom" => Ok(Anchor::MiddleBottom),
            other => Err(DomainError::Configuration(format!(
                "Unknown anchor '{}'. Valid anchors: center, leftTop, leftBottom, middleTop, middleBottom",
                other
            ))),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Anchor::Center => "center",
            Anchor::LeftTop => "leftTop",
            Anchor::LeftBottom => "leftBottom",
            Anchor::MiddleTop => "middleTop",
            Anchor::MiddleBottom => "middleBottom",
        };
        write!(f, "{}", name)
    }
}

/// Coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Vertical stacking behaviour of an anchor
enum Stacking {
    Down,
    Up,
    Centered,
}

impl Anchor {
    fn stacking(self) -> Stacking {
        match self {
            Anchor::LeftTop | Anchor::MiddleTop => Stacking::Down,
            Anchor::LeftBottom | Anchor::MiddleBottom => Stacking::Up,
            Anchor::Center => Stacking::Centered,
        }
    }

    /// Single-line coordinate expression
    pub fn base(self, axis: Axis) -> String {
        match (self, axis) {
            (Anchor::LeftTop | Anchor::LeftBottom, Axis::X) => EDGE_MARGIN.to_string(),
            (_, Axis::X) => "(main_w/2-text_w/2)".to_string(),
            (Anchor::LeftTop, Axis::Y) => EDGE_MARGIN.to_string(),
            (Anchor::MiddleTop, Axis::Y) => format!("(text_h/2)+{}", EDGE_MARGIN),
            (Anchor::LeftBottom | Anchor::MiddleBottom, Axis::Y) => {
                format!("main_h-(text_h)-{}", EDGE_MARGIN)
            }
            (Anchor::Center, Axis::Y) => "(main_h/2-text_h/2)".to_string(),
        }
    }
}

/// Number of line pitches a line is moved from the anchor's base position.
///
/// Top anchors stack downwards, bottom anchors upwards (the last line sits on
/// the bottom margin), center spreads the block symmetrically.
pub fn line_offset(anchor: Anchor, line_index: usize, total_lines: usize) -> f64 {
    if total_lines <= 1 {
        return 0.0;
    }
    let index = line_index as f64;
    let last = (total_lines - 1) as f64;
    match anchor.stacking() {
        Stacking::Down => index,
        Stacking::Up => index - last,
        Stacking::Centered => index - last / 2.0,
    }
}

/// Position expression for one line of a text block
pub fn position(
    anchor: Anchor,
    axis: Axis,
    line_index: usize,
    total_lines: usize,
    font_size: u32,
) -> String {
    let base = anchor.base(axis);
    if axis == Axis::X {
        return base;
    }
    let offset = line_offset(anchor, line_index, total_lines);
    if offset == 0.0 {
        return base;
    }
    let gap = (font_size as f64 * LINE_GAP_RATIO * 1000.0).round() / 1000.0;
    format!("{}+({})*(text_h+{})", base, offset, gap)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Anchor; 5] = [
        Anchor::Center,
        Anchor::LeftTop,
        Anchor::LeftBottom,
        Anchor::MiddleTop,
        Anchor::MiddleBottom,
    ];

    #[test]
    fn test_single_line_matches_base() {
        for anchor in ALL {
            assert_eq!(position(anchor, Axis::Y, 0, 1, 48), anchor.base(Axis::Y));
            assert_eq!(position(anchor, Axis::X, 0, 1, 48), anchor.base(Axis::X));
        }
        assert_eq!(position(Anchor::Center, Axis::Y, 0, 1, 48), "(main_h/2-text_h/2)");
    }

    #[test]
    fn test_x_is_line_independent() {
        for anchor in ALL {
            let first = position(anchor, Axis::X, 0, 4, 30);
            for line in 1..4 {
                assert_eq!(position(anchor, Axis::X, line, 4, 30), first);
            }
        }
    }

    #[test]
    fn test_center_is_symmetric_and_monotonic() {
        for total in 2..6 {
            let offsets: Vec<f64> = (0..total)
                .map(|i| line_offset(Anchor::Center, i, total))
                .collect();
            let sum: f64 = offsets.iter().sum();
            assert!(sum.abs() < 1e-9);
            assert!(offsets.windows(2).all(|w| w[0] < w[1]));
            for i in 0..total {
                assert_eq!(offsets[i], -offsets[total - 1 - i]);
            }
        }
    }

    #[test]
    fn test_center_multi_line_expressions() {
        assert_eq!(
            position(Anchor::Center, Axis::Y, 0, 2, 40),
            "(main_h/2-text_h/2)+(-0.5)*(text_h+4)"
        );
        assert_eq!(
            position(Anchor::Center, Axis::Y, 1, 2, 40),
            "(main_h/2-text_h/2)+(0.5)*(text_h+4)"
        );
    }

    #[test]
    fn test_top_stacks_down_bottom_stacks_up() {
        assert_eq!(position(Anchor::LeftTop, Axis::Y, 0, 3, 20), "15");
        assert_eq!(position(Anchor::LeftTop, Axis::Y, 2, 3, 20), "15+(2)*(text_h+2)");
        assert_eq!(
            position(Anchor::MiddleBottom, Axis::Y, 2, 3, 20),
            "main_h-(text_h)-15"
        );
        assert_eq!(
            position(Anchor::MiddleBottom, Axis::Y, 0, 3, 20),
            "main_h-(text_h)-15+(-2)*(text_h+2)"
        );
    }

    #[test]
    fn test_anchor_parse() {
        assert_eq!("middleBottom".parse::<Anchor>().unwrap(), Anchor::MiddleBottom);
        assert!(matches!(
            "rightTop".parse::<Anchor>(),
            Err(DomainError::Configuration(_))
        ));
    }
}
