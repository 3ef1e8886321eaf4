//! Sprite sheet placement.
//!
//! Two packers share the same feed-then-finish shape. [`DirectionalSheet`]
//! concatenates images along one axis. [`TiledSheet`] places images at an
//! advancing cursor and wraps to a new line when the bound is reached.
//! Images are pasted, never blended, and canvases only ever grow.

use image::RgbaImage;

use crate::render::{grow, new_canvas, paste};
use crate::types::{Bounds, Direction, Size};

/// Round `value` up to a multiple of `step`. A zero step leaves it alone.
fn ceil_to(value: u32, step: u32) -> u32 {
    if step == 0 {
        value
    } else {
        value.div_ceil(step).saturating_mul(step)
    }
}

/// Concatenates images along the sheet direction.
///
/// Horizontal sheets hold frame strips, so variants stack downwards;
/// vertical sheets hold frame columns, so variants stack to the right.
#[derive(Debug)]
pub struct DirectionalSheet {
    direction: Direction,
    canvas: Option<RgbaImage>,
}

impl DirectionalSheet {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            canvas: None,
        }
    }

    /// Append an image after everything placed so far.
    pub fn push(&mut self, image: &RgbaImage) {
        let Some(canvas) = self.canvas.take() else {
            self.canvas = Some(image.clone());
            return;
        };

        let (width, height) = canvas.dimensions();
        let (w, h) = image.dimensions();
        let (size, position) = match self.direction {
            Direction::Vertical => ((width.saturating_add(w), height.max(h)), (width, 0)),
            Direction::Horizontal => ((width.max(w), height.saturating_add(h)), (0, height)),
        };

        let mut canvas = grow(canvas, size);
        paste(&mut canvas, image, position);
        self.canvas = Some(canvas);
    }

    /// Grow the stacking axis to the next multiple of `frame`.
    pub fn pad_to_grid(&mut self, frame: Size) {
        let Some(canvas) = self.canvas.take() else {
            return;
        };
        let (width, height) = canvas.dimensions();
        let size = match self.direction {
            Direction::Horizontal => (width, ceil_to(height, frame.1)),
            Direction::Vertical => (ceil_to(width, frame.0), height),
        };
        self.canvas = Some(grow(canvas, size));
    }

    pub fn finish(self) -> Option<RgbaImage> {
        self.canvas
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Wrapping grid placement bounded by pixels or cell counts.
#[derive(Debug)]
pub struct TiledSheet {
    bound: Size,
    primary: Axis,
    from_cells: bool,
    canvas: Option<RgbaImage>,
    cursor: (u32, u32),
    last: Size,
}

impl TiledSheet {
    /// `bound` comes from the tiling size; an axis without a bound is 0.
    pub fn new(bound: Size, bounds: &Bounds, direction: Direction) -> Self {
        let primary = if bound.0 > 0 && (bound.1 == 0 || direction == Direction::Vertical) {
            Axis::X
        } else {
            Axis::Y
        };

        Self {
            bound,
            primary,
            from_cells: bounds.has_cells(),
            canvas: None,
            cursor: (0, 0),
            last: (0, 0),
        }
    }

    /// Where the next image would go before wrapping.
    #[cfg(test)]
    fn cursor(&self) -> (u32, u32) {
        self.cursor
    }

    /// Size the canvas starts at for the first image.
    fn initial_size(&self, (w, h): Size) -> Size {
        let (bw, bh) = self.bound;
        let size = if self.from_cells {
            (w, h)
        } else {
            match (bw > 0, bh > 0) {
                (true, true) => (bw, bh),
                (true, false) => (bw, h),
                _ => (w, bh),
            }
        };
        (size.0.max(w), size.1.max(h))
    }

    /// Place an image at the cursor, wrapping first if it would cross the
    /// bound.
    pub fn place(&mut self, image: &RgbaImage) {
        let (w, h) = image.dimensions();

        let canvas = match self.canvas.take() {
            None => {
                self.cursor = (0, 0);
                new_canvas(self.initial_size((w, h)))
            }
            Some(canvas) => {
                let (cx, cy) = &mut self.cursor;
                match self.primary {
                    Axis::X if cx.saturating_add(w) > self.bound.0 => {
                        *cx = 0;
                        *cy = cy.saturating_add(h);
                    }
                    Axis::Y if cy.saturating_add(h) > self.bound.1 => {
                        *cy = 0;
                        *cx = cx.saturating_add(w);
                    }
                    _ => {}
                }
                canvas
            }
        };

        let (cx, cy) = self.cursor;
        let needed = (cx.saturating_add(w), cy.saturating_add(h));
        let mut canvas = grow(canvas, needed);
        paste(&mut canvas, image, (cx, cy));
        self.canvas = Some(canvas);

        match self.primary {
            Axis::X => self.cursor.0 = cx.saturating_add(w),
            Axis::Y => self.cursor.1 = cy.saturating_add(h),
        }
        self.last = (w, h);
    }

    /// Move the cursor for the first image of a new group.
    ///
    /// A continuous group keeps packing on the current line unless its
    /// secondary extent differs from the last image; with `snap` the cursor
    /// then moves to the next multiple of the frame size. Other groups start
    /// a new line.
    pub fn start_group(&mut self, (w, h): Size, continuous: bool, snap: Option<Size>) {
        if self.canvas.is_none() {
            return;
        }

        let (last_w, last_h) = self.last;
        let (cx, cy) = &mut self.cursor;
        match self.primary {
            Axis::X if continuous && h == last_h => {
                if let Some(frame) = snap {
                    *cx = ceil_to(*cx, frame.0);
                }
            }
            Axis::X => {
                *cx = 0;
                *cy = cy.saturating_add(last_h);
            }
            Axis::Y if continuous && w == last_w => {
                if let Some(frame) = snap {
                    *cy = ceil_to(*cy, frame.1);
                }
            }
            Axis::Y => {
                *cy = 0;
                *cx = cx.saturating_add(last_w);
            }
        }
    }

    pub fn finish(self) -> Option<RgbaImage> {
        self.canvas
    }
}
