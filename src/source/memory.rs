//! In-memory layer containers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::{OraError, Result};
use crate::types::Size;

use super::{LayerEntry, LayerSource};

#[derive(Debug, Clone, Default)]
struct Container {
    size: Option<Size>,
    layers: Vec<(String, RgbaImage)>,
}

/// A [`LayerSource`] backed by bitmaps registered in code.
///
/// Each layer's `src` is its name. The container size defaults to the size
/// of its first layer.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    containers: HashMap<PathBuf, Container>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer to a container, creating the container if needed.
    pub fn add_layer(
        &mut self,
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        bitmap: RgbaImage,
    ) {
        let container = self.containers.entry(path.into()).or_default();
        if container.size.is_none() {
            container.size = Some(bitmap.dimensions());
        }
        container.layers.push((name.into(), bitmap));
    }

    /// Override a container's canvas size.
    pub fn set_size(&mut self, path: impl Into<PathBuf>, size: Size) {
        self.containers.entry(path.into()).or_default().size = Some(size);
    }

    fn container(&self, path: &Path) -> Result<&Container> {
        self.containers.get(path).ok_or_else(|| OraError::Source {
            path: path.to_path_buf(),
            message: "Unknown container".to_string(),
        })
    }
}

impl LayerSource for MemorySource {
    fn exists(&self, path: &Path) -> bool {
        self.containers.contains_key(path)
    }

    fn list_layers(&mut self, path: &Path) -> Result<Vec<LayerEntry>> {
        Ok(self
            .container(path)?
            .layers
            .iter()
            .map(|(name, _)| LayerEntry::new(name.clone(), name.clone()))
            .collect())
    }

    fn decode(&mut self, path: &Path, src: &str) -> Result<RgbaImage> {
        self.container(path)?
            .layers
            .iter()
            .find(|(name, _)| name == src)
            .map(|(_, bitmap)| bitmap.clone())
            .ok_or_else(|| OraError::Source {
                path: path.to_path_buf(),
                message: format!("Unknown layer {}", src),
            })
    }

    fn intrinsic_size(&mut self, path: &Path) -> Result<Option<Size>> {
        Ok(self.container(path)?.size)
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_memory_source_round_trip() {
        let mut source = MemorySource::new();
        source.add_layer("a.ora", "base", RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4])));
        source.add_layer("a.ora", "top", RgbaImage::new(5, 5));

        assert!(source.exists(Path::new("a.ora")));
        assert!(!source.exists(Path::new("b.ora")));

        let layers = source.list_layers(Path::new("a.ora")).unwrap();
        assert_eq!(layers, vec![LayerEntry::new("base", "base"), LayerEntry::new("top", "top")]);
        assert_eq!(source.intrinsic_size(Path::new("a.ora")).unwrap(), Some((3, 2)));

        let base = source.decode(Path::new("a.ora"), "base").unwrap();
        assert_eq!(base.get_pixel(2, 1).0, [1, 2, 3, 4]);
        assert!(source.decode(Path::new("a.ora"), "missing").is_err());
    }

    #[test]
    fn test_set_size_overrides_first_layer() {
        let mut source = MemorySource::new();
        source.add_layer("a.ora", "base", RgbaImage::new(3, 2));
        source.set_size("a.ora", (8, 8));
        assert_eq!(source.intrinsic_size(Path::new("a.ora")).unwrap(), Some((8, 8)));
    }
}
