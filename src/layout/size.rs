//! Canvas and sheet geometry.
//!
//! Pure helpers compute padded sizes, variant canvases and frame cells.
//! [`Sizer`] adds the lookups that need layer data: intrinsic sizes and the
//! minimum bounding size of a group, which drive tiled sheets.

use crate::config::{Group, Input, OrderedMap};
use crate::error::{OraError, Result};
use crate::source::{LayerMap, LayerSource};
use crate::types::{Bounds, Direction, Mode, Size};

use super::frames::eligible_variants;
use super::job::Settings;

/// Stack `count` cells along `direction`.
fn stack((width, height): Size, count: u32, direction: Direction) -> Size {
    match direction {
        Direction::Horizontal => (width.saturating_mul(count), height),
        Direction::Vertical => (width, height.saturating_mul(count)),
    }
}

/// Padded size of `frames` frames laid out along `direction`.
pub fn padded_size(size: Size, settings: &Settings, frames: usize) -> Size {
    let padding = settings.padding;
    let cell = (
        size.0.saturating_add(padding.horizontal()),
        size.1.saturating_add(padding.vertical()),
    );
    if frames > 1 {
        stack(cell, count(frames), settings.direction)
    } else {
        cell
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Canvas of one rendered variant holding `frames` frames.
pub fn canvas_size(settings: &Settings, intrinsic: Size, frames: usize) -> Size {
    let cell = padded_size(intrinsic, settings, 1);
    match settings.mode {
        Mode::Frames => cell,
        Mode::Sheet | Mode::SheetFrames => stack(cell, count(frames), settings.direction),
        Mode::Images if settings.bounds.is_unbounded() => {
            stack(cell, count(frames), settings.direction)
        }
        Mode::Images => {
            let (cols, rows) = grid(&settings.bounds, settings.direction, cell, count(frames));
            (cell.0.saturating_mul(cols), cell.1.saturating_mul(rows))
        }
    }
}

/// Columns and rows needed for `n` cells under explicit bounds.
fn grid(bounds: &Bounds, direction: Direction, cell: Size, n: u32) -> (u32, u32) {
    let n = n.max(1);
    let by_cols = |cols: u32| {
        let cols = cols.min(n);
        (cols, n.div_ceil(cols))
    };
    let by_rows = |rows: u32| {
        let rows = rows.min(n);
        (n.div_ceil(rows), rows)
    };

    if !bounds.has_pixels() {
        return match (bounds.cols > 0, bounds.rows > 0) {
            (true, true) if direction == Direction::Vertical => by_rows(bounds.rows),
            (true, _) => by_cols(bounds.cols),
            _ => by_rows(bounds.rows),
        };
    }

    let fit_cols = || {
        let cols = (bounds.width / cell.0.max(1)).max(1);
        (cols, n.div_ceil(cols))
    };
    let fit_rows = || {
        let rows = (bounds.height / cell.1.max(1)).max(1);
        (n.div_ceil(rows), rows)
    };
    match (bounds.width > 0, bounds.height > 0) {
        (true, true) if direction == Direction::Vertical => fit_rows(),
        (true, _) => fit_cols(),
        _ => fit_rows(),
    }
}

/// Column and row of frame `index` inside a variant canvas.
pub fn frame_cell(index: usize, canvas: Size, cell: Size, direction: Direction) -> (u32, u32) {
    let index = count(index);
    match direction {
        Direction::Horizontal => {
            let per_row = (canvas.0 / cell.0.max(1)).max(1);
            (index % per_row, index / per_row)
        }
        Direction::Vertical => {
            let per_col = (canvas.1 / cell.1.max(1)).max(1);
            (index / per_col, index % per_col)
        }
    }
}

/// Size lookups for one job.
pub struct Sizer<'a> {
    pub layer_map: &'a LayerMap,
    pub input: &'a Input,
    pub groups: &'a OrderedMap<Group>,
    pub settings: &'a Settings,
    /// Frames stacked in each placed image.
    pub frames_per_image: usize,
}

impl Sizer<'_> {
    /// Unpadded size of a variant.
    ///
    /// A `size` on the first group listing the variant wins over the
    /// container's own canvas.
    pub fn intrinsic_size(
        &self,
        source: &mut dyn LayerSource,
        variant: &str,
    ) -> Result<Option<Size>> {
        let Some(location) = self.layer_map.get(variant) else {
            return Err(OraError::Build {
                message: format!("Variant not found. ({})", variant),
                help: None,
            });
        };

        let forced = self
            .groups
            .iter()
            .filter(|(_, group)| group.variants.iter().any(|v| v == variant))
            .find_map(|(_, group)| group.size);
        if let Some([width, height]) = forced {
            return Ok(Some((width, height)));
        }

        source.intrinsic_size(&location.path)
    }

    /// Largest padded image size across the eligible variants of one group,
    /// or of every group.
    ///
    /// With `first_only`, stops after the first group that yields a non-zero
    /// size.
    pub fn min_group_size(
        &self,
        source: &mut dyn LayerSource,
        group: Option<&str>,
        first_only: bool,
    ) -> Result<Size> {
        let mut size: Size = (0, 0);

        for (name, candidate) in self.groups.iter() {
            if group.is_some_and(|wanted| wanted != name) {
                continue;
            }

            for variant in eligible_variants(self.input, candidate, self.layer_map) {
                let Some(intrinsic) = self.intrinsic_size(source, &variant)? else {
                    continue;
                };
                let padded = padded_size(intrinsic, self.settings, self.frames_per_image);
                size = (size.0.max(padded.0), size.1.max(padded.1));
            }

            if first_only && size != (0, 0) {
                break;
            }
        }

        Ok(size)
    }

    /// Bound of a tiled sheet, or `None` when the sheet is directional.
    ///
    /// An axis without a bound is 0.
    pub fn tiling_size(
        &self,
        source: &mut dyn LayerSource,
        group: Option<&str>,
    ) -> Result<Option<Size>> {
        let bounds = self.settings.bounds;
        if bounds.is_unbounded() {
            return Ok(None);
        }

        let min = self.min_group_size(source, group, false)?;
        let axis = |bound: u32, floor: u32| if bound > 0 { bound.max(floor) } else { 0 };

        if bounds.has_pixels() {
            return Ok(Some((axis(bounds.width, min.0), axis(bounds.height, min.1))));
        }

        let first = self.min_group_size(source, group, true)?;
        Ok(Some((
            axis(bounds.cols.saturating_mul(first.0), min.0),
            axis(bounds.rows.saturating_mul(first.1), min.1),
        )))
    }
}
