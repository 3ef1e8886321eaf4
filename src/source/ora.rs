//! OpenRaster (`.ora`) containers.
//!
//! An `.ora` file is a zip archive with a `stack.xml` layer tree, one PNG per
//! layer (usually under `data/`) and an optional flattened `mergedimage.png`.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};
use zip::ZipArchive;

use crate::error::{OraError, Result};
use crate::types::Size;

use super::{LayerEntry, LayerSource};

const STACK_XML: &str = "stack.xml";
const MERGED_IMAGE: &str = "mergedimage.png";

/// Reads layers from `.ora` files, caching everything per path.
#[derive(Default)]
pub struct OraSource {
    layers: HashMap<PathBuf, Vec<LayerEntry>>,
    sizes: HashMap<PathBuf, Option<Size>>,
    bitmaps: HashMap<(PathBuf, String), RgbaImage>,
}

impl OraSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayerSource for OraSource {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_layers(&mut self, path: &Path) -> Result<Vec<LayerEntry>> {
        if let Some(layers) = self.layers.get(path) {
            return Ok(layers.clone());
        }

        let mut archive = open(path)?;
        let stack = read_entry(&mut archive, path, STACK_XML)?;
        let stack = String::from_utf8(stack)
            .map_err(|e| source_error(path, format!("{} is not UTF-8: {}", STACK_XML, e)))?;
        let layers = parse_stack(&stack).map_err(|message| source_error(path, message))?;

        self.layers.insert(path.to_path_buf(), layers.clone());
        Ok(layers)
    }

    fn decode(&mut self, path: &Path, src: &str) -> Result<RgbaImage> {
        let key = (path.to_path_buf(), src.to_string());
        if let Some(bitmap) = self.bitmaps.get(&key) {
            return Ok(bitmap.clone());
        }

        let mut archive = open(path)?;
        let bytes = read_entry(&mut archive, path, src)?;
        let bitmap = image::load_from_memory(&bytes)
            .map_err(|e| source_error(path, format!("Failed to decode {}: {}", src, e)))?
            .to_rgba8();

        self.bitmaps.insert(key, bitmap.clone());
        Ok(bitmap)
    }

    fn intrinsic_size(&mut self, path: &Path) -> Result<Option<Size>> {
        if let Some(size) = self.sizes.get(path) {
            return Ok(*size);
        }

        let mut archive = open(path)?;

        let mut candidate = None;
        for i in 0..archive.len() {
            let entry = archive
                .by_index(i)
                .map_err(|e| source_error(path, format!("Failed to read entry {}: {}", i, e)))?;
            let name = entry.name();
            if name == MERGED_IMAGE {
                candidate = Some(name.to_string());
                break;
            }
            if candidate.is_none() && name.starts_with("data/") && name.ends_with(".png") {
                candidate = Some(name.to_string());
            }
        }

        let size = match candidate {
            Some(name) => {
                let bytes = read_entry(&mut archive, path, &name)?;
                Some(png_dimensions(&bytes).map_err(|message| source_error(path, message))?)
            }
            None => None,
        };

        self.sizes.insert(path.to_path_buf(), size);
        Ok(size)
    }

    fn reset(&mut self) {
        self.layers.clear();
        self.sizes.clear();
        self.bitmaps.clear();
    }
}

fn open(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).map_err(|e| OraError::Io {
        path: path.to_path_buf(),
        message: format!("Failed to open container: {}", e),
    })?;
    ZipArchive::new(BufReader::new(file))
        .map_err(|e| source_error(path, format!("Not a valid OpenRaster archive: {}", e)))
}

fn read_entry(
    archive: &mut ZipArchive<BufReader<File>>,
    path: &Path,
    name: &str,
) -> Result<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| source_error(path, format!("Missing {}: {}", name, e)))?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| source_error(path, format!("Failed to read {}: {}", name, e)))?;
    Ok(bytes)
}

/// Collect named layers from `stack.xml` in document order. Layers without
/// a name or a `src` are ignored.
fn parse_stack(xml: &str) -> std::result::Result<Vec<LayerEntry>, String> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| format!("Invalid {}: {}", STACK_XML, e))?;

    let layers = doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name().ends_with("layer"))
        .filter_map(|node| {
            let name = node.attribute("name").filter(|n| !n.is_empty())?;
            let src = node.attribute("src").filter(|s| !s.is_empty())?;
            Some(LayerEntry::new(name, src))
        })
        .collect();

    Ok(layers)
}

fn png_dimensions(bytes: &[u8]) -> std::result::Result<Size, String> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image header: {}", e))?
        .into_dimensions()
        .map_err(|e| format!("Failed to read image size: {}", e))
}

fn source_error(path: &Path, message: impl Into<String>) -> OraError {
    OraError::Source {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
