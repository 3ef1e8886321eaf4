//! Rendering module for orasprite.
//!
//! Pixel-level work: recolouring layers with a theme, blending layers into
//! frames, and writing finished images.

mod colour_map;
mod composite;
mod png;

pub use colour_map::{ColourMap, Replacement};
pub use composite::{blend, blend_in_place, grow, new_canvas, paste};
pub use png::{DryRunSink, ImageSink, MemorySink, PngSink};
