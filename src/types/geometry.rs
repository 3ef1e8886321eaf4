//! Layout vocabulary: output modes, stacking direction, padding and sheet bounds.

use std::fmt;
use std::str::FromStr;

use serde::de::IgnoredAny;
use serde::Deserialize;

use crate::error::{OraError, Result};

/// Width and height in pixels.
pub type Size = (u32, u32);

/// What an output config produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One image per variant.
    Images,
    /// One image per variant per template frame.
    Frames,
    /// One packed sheet with every variant.
    Sheet,
    /// One packed sheet per template frame.
    SheetFrames,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Images => "images",
            Mode::Frames => "frames",
            Mode::Sheet => "sheet",
            Mode::SheetFrames => "sheet_frames",
        }
    }
}

impl FromStr for Mode {
    type Err = OraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "images" => Ok(Mode::Images),
            "frames" => Ok(Mode::Frames),
            "sheet" => Ok(Mode::Sheet),
            "sheet_frames" => Ok(Mode::SheetFrames),
            _ => Err(OraError::Parse {
                message: format!("Invalid mode. ({})", s),
                help: Some("Use images, frames, sheet, or sheet_frames".to_string()),
            }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis along which frames of one variant are laid out.
///
/// Sheets stack variants across the other axis: a horizontal sheet is a
/// column of frame strips, a vertical sheet is a row of frame columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Horizontal => "horizontal",
            Direction::Vertical => "vertical",
        }
    }
}

impl FromStr for Direction {
    type Err = OraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "horizontal" => Ok(Direction::Horizontal),
            "vertical" => Ok(Direction::Vertical),
            _ => Err(OraError::Parse {
                message: format!("Invalid direction. ({})", s),
                help: Some("Use horizontal or vertical".to_string()),
            }),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Padding as written in a config: one number or a list of sides.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PaddingSpec {
    Uniform(i64),
    Sides(Vec<i64>),
    Invalid(IgnoredAny),
}

impl Default for PaddingSpec {
    fn default() -> Self {
        PaddingSpec::Uniform(0)
    }
}

/// Padding around every frame, CSS order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Padding {
    pub const fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self { top, right, bottom, left }
    }

    pub const fn uniform(v: u32) -> Self {
        Self::new(v, v, v, v)
    }

    /// Normalise a padding spec.
    ///
    /// `v` pads every side, `[v, h]` vertical and horizontal, `[t, h, b]`
    /// top, horizontal and bottom, `[t, r, b, l]` each side.
    pub fn from_spec(spec: &PaddingSpec) -> Result<Self> {
        let invalid = || OraError::Parse {
            message: "Invalid padding".to_string(),
            help: Some("Use a number or a list of 2, 3, or 4 non-negative numbers".to_string()),
        };
        let side = |v: i64| u32::try_from(v).map_err(|_| invalid());

        match spec {
            PaddingSpec::Uniform(v) => Ok(Self::uniform(side(*v)?)),
            PaddingSpec::Sides(sides) => match sides.as_slice() {
                [v, h] => Ok(Self::new(side(*v)?, side(*h)?, side(*v)?, side(*h)?)),
                [t, h, b] => Ok(Self::new(side(*t)?, side(*h)?, side(*b)?, side(*h)?)),
                [t, r, b, l] => Ok(Self::new(side(*t)?, side(*r)?, side(*b)?, side(*l)?)),
                _ => Err(invalid()),
            },
            PaddingSpec::Invalid(_) => Err(invalid()),
        }
    }

    pub fn horizontal(&self) -> u32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> u32 {
        self.top + self.bottom
    }
}

/// Sheet bounds from `width`, `height`, `cols` and `rows`. Zero means unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
    pub cols: u32,
    pub rows: u32,
}

impl Bounds {
    /// Build bounds from raw config values; non-positive values are unset.
    pub fn from_config(width: i64, height: i64, cols: i64, rows: i64) -> Self {
        let clamp = |v: i64| u32::try_from(v.max(0)).unwrap_or(u32::MAX);
        Self {
            width: clamp(width),
            height: clamp(height),
            cols: clamp(cols),
            rows: clamp(rows),
        }
    }

    /// No bound is set, so sheets stack along the direction.
    pub fn is_unbounded(&self) -> bool {
        self.width == 0 && self.height == 0 && self.cols == 0 && self.rows == 0
    }

    /// Bounds are given as cell counts rather than pixels.
    pub fn has_cells(&self) -> bool {
        self.cols > 0 || self.rows > 0
    }

    pub fn has_pixels(&self) -> bool {
        self.width > 0 || self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sides(v: &[i64]) -> PaddingSpec {
        PaddingSpec::Sides(v.to_vec())
    }

    #[test]
    fn test_padding_uniform() {
        let p = Padding::from_spec(&PaddingSpec::Uniform(5)).unwrap();
        assert_eq!(p, Padding::new(5, 5, 5, 5));
    }

    #[test]
    fn test_padding_two_sides() {
        assert_eq!(Padding::from_spec(&sides(&[5, 10])).unwrap(), Padding::new(5, 10, 5, 10));
    }

    #[test]
    fn test_padding_three_sides() {
        assert_eq!(
            Padding::from_spec(&sides(&[5, 10, 15])).unwrap(),
            Padding::new(5, 10, 15, 10)
        );
    }

    #[test]
    fn test_padding_four_sides() {
        assert_eq!(
            Padding::from_spec(&sides(&[5, 10, 15, 20])).unwrap(),
            Padding::new(5, 10, 15, 20)
        );
    }

    #[test]
    fn test_padding_bad_arity() {
        assert!(Padding::from_spec(&sides(&[1, 2, 3, 4, 5])).is_err());
        assert!(Padding::from_spec(&sides(&[1])).is_err());
        assert!(Padding::from_spec(&sides(&[])).is_err());
    }

    #[test]
    fn test_padding_negative() {
        assert!(Padding::from_spec(&PaddingSpec::Uniform(-1)).is_err());
        assert!(Padding::from_spec(&sides(&[1, -2])).is_err());
    }

    #[test]
    fn test_padding_spec_from_json() {
        let spec: PaddingSpec = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(Padding::from_spec(&spec).unwrap(), Padding::new(1, 2, 1, 2));

        let spec: PaddingSpec = serde_json::from_str("\"wide\"").unwrap();
        assert!(Padding::from_spec(&spec).is_err());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("sheet_frames".parse::<Mode>().unwrap(), Mode::SheetFrames);
        assert!("sheets".parse::<Mode>().is_err());
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("vertical".parse::<Direction>().unwrap(), Direction::Vertical);
        assert!("diagonal".parse::<Direction>().is_err());
        assert_eq!(Direction::default().to_string(), "horizontal");
    }

    #[test]
    fn test_bounds_unset_values() {
        let b = Bounds::from_config(0, -4, 0, 0);
        assert!(b.is_unbounded());

        let b = Bounds::from_config(0, 0, 2, 0);
        assert!(!b.is_unbounded());
        assert!(b.has_cells());
        assert!(!b.has_pixels());
    }
}
