//! Core domain types for orasprite.
//!
//! - `Colour` - hex colours from config files, with optional alpha
//! - `Mode`, `Direction` - what an output config produces and how it stacks
//! - `Padding`, `Bounds` - frame padding and sheet limits

mod colour;
mod geometry;

pub use colour::Colour;
pub use geometry::{Bounds, Direction, Mode, Padding, PaddingSpec, Size};
