//! orasprite - OpenRaster sprite pipeline
//!
//! Compiles layered OpenRaster images into game-ready sprites: single
//! images, animation frame sequences and packed sprite sheets, with palette
//! themes, driven by a declarative config.

pub mod cli;
pub mod config;
pub mod error;
pub mod layout;
pub mod output;
pub mod render;
pub mod report;
pub mod source;
pub mod types;

pub use config::{Config, CONFIG_FILENAME};
pub use error::{OraError, Result};
pub use layout::Engine;
pub use render::{blend, ColourMap, DryRunSink, ImageSink, MemorySink, PngSink};
pub use report::{Diagnostic, Report, Severity};
pub use source::{LayerMap, LayerSource, MemorySource, OraSource};
pub use types::{Colour, Direction, Mode, Padding};
