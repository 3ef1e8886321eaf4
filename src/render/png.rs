//! PNG output for composited images.
//!
//! The engine hands finished images to an [`ImageSink`]. [`PngSink`] writes
//! them to disk; [`MemorySink`] keeps them for inspection in tests;
//! [`DryRunSink`] only records where they would go.

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};

use crate::error::{OraError, Result};
use crate::types::Size;

/// Destination for finished images.
pub trait ImageSink {
    /// Make sure the directory that will hold `path` exists.
    fn ensure_directory(&mut self, path: &Path) -> Result<()>;

    /// Persist one image. Writing the same path again replaces it.
    fn write_png(&mut self, path: &Path, image: &RgbaImage) -> Result<()>;
}

/// Writes PNG files to the file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngSink;

impl ImageSink for PngSink {
    fn ensure_directory(&mut self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        fs::create_dir_all(parent).map_err(|e| OraError::Io {
            path: parent.to_path_buf(),
            message: format!("Failed to create output directory: {}", e),
        })
    }

    fn write_png(&mut self, path: &Path, image: &RgbaImage) -> Result<()> {
        image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| OraError::Io {
                path: path.to_path_buf(),
                message: format!("Failed to write PNG: {}", e),
            })
    }
}

/// Keeps written images in memory, in write order.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    writes: Vec<(PathBuf, RgbaImage)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write, including overwritten ones.
    pub fn writes(&self) -> &[(PathBuf, RgbaImage)] {
        &self.writes
    }

    /// The latest image written to a path.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&RgbaImage> {
        let path = path.as_ref();
        self.writes
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, image)| image)
    }

    pub fn clear(&mut self) {
        self.writes.clear();
    }
}

impl ImageSink for MemorySink {
    fn ensure_directory(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn write_png(&mut self, path: &Path, image: &RgbaImage) -> Result<()> {
        self.writes.push((path.to_path_buf(), image.clone()));
        Ok(())
    }
}

/// Records the path and size of each write and drops the pixels.
#[derive(Debug, Clone, Default)]
pub struct DryRunSink {
    planned: Vec<(PathBuf, Size)>,
}

impl DryRunSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct paths in first-write order, with the size last written.
    pub fn planned(&self) -> &[(PathBuf, Size)] {
        &self.planned
    }
}

impl ImageSink for DryRunSink {
    fn ensure_directory(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn write_png(&mut self, path: &Path, image: &RgbaImage) -> Result<()> {
        let size = image.dimensions();
        match self.planned.iter_mut().find(|(p, _)| p == path) {
            Some(entry) => entry.1 = size,
            None => self.planned.push((path.to_path_buf(), size)),
        }
        Ok(())
    }
}
