//! Layered source images.
//!
//! The engine reads layers through the [`LayerSource`] trait so that the
//! container format stays out of the layout code. [`OraSource`] reads
//! OpenRaster files; [`MemorySource`] serves layers held in memory.
//!
//! The [`LayerMap`] ties every layer name found in a run's inputs to the
//! container it was loaded from.

mod memory;
mod ora;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::Result;
use crate::types::Size;

pub use memory::MemorySource;
pub use ora::OraSource;

/// A named layer inside a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerEntry {
    /// Layer name as shown in the painting program.
    pub name: String,
    /// Container-internal path of the layer bitmap.
    pub src: String,
}

impl LayerEntry {
    pub fn new(name: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            src: src.into(),
        }
    }
}

/// Read access to layered containers.
///
/// Implementations cache per container path; containers are treated as
/// unchanged for the duration of a run. [`LayerSource::reset`] drops every
/// cache and is called at the start of each run.
pub trait LayerSource {
    /// Whether the container exists at all.
    fn exists(&self, path: &Path) -> bool;

    /// Named layers of a container, in document order.
    fn list_layers(&mut self, path: &Path) -> Result<Vec<LayerEntry>>;

    /// Decode one layer bitmap as straight RGBA.
    fn decode(&mut self, path: &Path, src: &str) -> Result<RgbaImage>;

    /// Canvas size of the container, if it holds any raster to measure.
    fn intrinsic_size(&mut self, path: &Path) -> Result<Option<Size>>;

    /// Drop all cached data.
    fn reset(&mut self);
}

/// Where a layer lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerLocation {
    pub path: PathBuf,
    pub src: String,
}

/// Layer name -> container, for every container loaded in a run.
#[derive(Debug, Clone, Default)]
pub struct LayerMap {
    layers: HashMap<String, LayerLocation>,
}

impl LayerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a container's layers.
    ///
    /// Within one container the first layer of a name wins; across
    /// containers the most recently loaded one does.
    pub fn insert_container(&mut self, path: &Path, entries: &[LayerEntry]) {
        let mut seen: Vec<&str> = Vec::with_capacity(entries.len());
        for entry in entries {
            if seen.contains(&entry.name.as_str()) {
                continue;
            }
            seen.push(&entry.name);
            self.layers.insert(
                entry.name.clone(),
                LayerLocation {
                    path: path.to_path_buf(),
                    src: entry.src.clone(),
                },
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&LayerLocation> {
        self.layers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    /// File stem of the container holding a layer.
    pub fn image_stem(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(|location| location.path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn entries(names: &[(&str, &str)]) -> Vec<LayerEntry> {
        names.iter().map(|(n, s)| LayerEntry::new(*n, *s)).collect()
    }

    #[test]
    fn test_later_container_wins() {
        let mut map = LayerMap::new();
        map.insert_container(Path::new("a/first.ora"), &entries(&[("hero", "data/1.png")]));
        map.insert_container(Path::new("b/second.ora"), &entries(&[("hero", "data/9.png")]));

        let location = map.get("hero").unwrap();
        assert_eq!(location.path, PathBuf::from("b/second.ora"));
        assert_eq!(location.src, "data/9.png");
        assert_eq!(map.image_stem("hero").as_deref(), Some("second"));
    }

    #[test]
    fn test_first_duplicate_within_container_wins() {
        let mut map = LayerMap::new();
        map.insert_container(
            Path::new("a.ora"),
            &entries(&[("hero", "data/1.png"), ("hero", "data/2.png")]),
        );
        assert_eq!(map.get("hero").unwrap().src, "data/1.png");
    }

    #[test]
    fn test_missing_layer() {
        let map = LayerMap::new();
        assert!(!map.contains("ghost"));
        assert!(map.image_stem("ghost").is_none());
    }
}
