//! Per-config iteration context.
//!
//! Everything a placement strategy needs to know about the config being
//! rendered is gathered into a [`Job`] up front and passed down by
//! reference. Nothing about the current output, theme or input is kept in
//! mutable engine state.

use std::path::PathBuf;

use crate::config::{Continuous, Group, Input, OrderedMap, OutputConfig, Template};
use crate::error::Result;
use crate::render::ColourMap;
use crate::types::{Bounds, Direction, Mode, Padding, Size};

use super::path::{expand, PathVars};

/// Layout settings of one output config, parsed and normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mode: Mode,
    pub direction: Direction,
    pub padding: Padding,
    pub bounds: Bounds,
    pub group_padding: bool,
    pub continuous: Continuous,
    pub start_index: i64,
}

impl Settings {
    /// Parse mode and direction from a config. Padding is normalised by the
    /// caller, which decides what to do when it is invalid.
    pub fn from_config(config: &OutputConfig, padding: Padding) -> Result<Self> {
        let mode = config.mode.as_deref().unwrap_or(Mode::Images.as_str()).parse()?;
        let direction = match config.direction.as_deref() {
            Some(direction) => direction.parse()?,
            None => Direction::default(),
        };

        Ok(Self {
            mode,
            direction,
            padding,
            bounds: Bounds::from_config(config.width, config.height, config.cols, config.rows),
            group_padding: config.group_padding,
            continuous: config.continuous.clone(),
            start_index: config.start_index,
        })
    }

    /// Displayed index of a frame.
    pub fn frame_index(&self, frame: usize) -> i64 {
        self.start_index.saturating_add(i64::try_from(frame).unwrap_or(i64::MAX))
    }
}

/// An input ready to render: its config and its effective groups.
#[derive(Debug)]
pub struct PreparedInput<'a> {
    pub name: &'a str,
    pub input: &'a Input,
    pub groups: OrderedMap<Group>,
}

/// Everything known about one output config while it renders.
#[derive(Debug)]
pub struct Job<'a> {
    pub project: &'a str,
    pub version: &'a str,
    pub output: &'a str,
    pub theme: &'a str,
    pub input: &'a PreparedInput<'a>,
    pub colours: &'a ColourMap,
    pub template_name: &'a str,
    pub template: &'a Template,
    pub settings: Settings,
    /// Unexpanded output path, without extension.
    pub path: String,
}

impl<'a> Job<'a> {
    pub fn groups(&self) -> &'a OrderedMap<Group> {
        &self.input.groups
    }

    /// Sheets are split per group when the path names the group.
    pub fn is_split(&self) -> bool {
        self.path.contains("[[group]]") || self.path.contains("[[^group]]")
    }

    /// Path variables shared by every artifact of this job.
    pub fn vars(&self) -> PathVars<'_> {
        PathVars {
            name: self.project,
            version: self.version,
            theme: self.theme,
            input: self.input.name,
            output: self.output,
            template: self.template_name,
            mode: self.settings.mode,
            direction: self.settings.direction,
            variant: String::new(),
            image: String::new(),
            group: String::new(),
            frame: self.settings.start_index,
            frame_size: (0, 0),
            image_size: (0, 0),
        }
    }

    /// Final file path for an artifact.
    pub fn artifact_path(&self, vars: &PathVars<'_>) -> PathBuf {
        PathBuf::from(format!("{}.png", expand(&self.path, vars)))
    }
}

/// Placement details of the first variant on a sheet, used to name it.
#[derive(Debug, Clone, Default)]
pub struct SheetLead {
    pub image: String,
    pub frame_size: Size,
}
