//! Layers command implementation.
//!
//! Lists the layers of OpenRaster files, which become variant and frame
//! layer names in a pipeline config.

use std::path::{Path, PathBuf};

use clap::Args;
use walkdir::WalkDir;

use crate::error::{OraError, Result};
use crate::output::{display_path, plural, Printer};
use crate::source::{LayerSource, OraSource};

/// List the layers of OpenRaster files
#[derive(Args, Debug)]
pub struct LayersArgs {
    /// Files or directories to inspect (default: current directory)
    pub paths: Vec<PathBuf>,
}

/// Every `.ora` file under `paths`, directories walked recursively, sorted
/// within each directory.
pub fn find_ora_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for path in paths {
        if path.is_file() {
            found.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && is_ora(entry.path()) {
                found.push(entry.into_path());
            }
        }
    }
    found
}

fn is_ora(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ora"))
}

pub fn run(args: LayersArgs, printer: &Printer) -> Result<()> {
    let paths = if args.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.paths
    };

    let files = find_ora_files(&paths);
    if files.is_empty() {
        printer.warning("Found", "no .ora files");
        return Ok(());
    }

    let mut source = OraSource::new();
    let mut failed = 0;
    for file in &files {
        let listed = source
            .list_layers(file)
            .and_then(|layers| Ok((layers, source.intrinsic_size(file)?)));
        let (layers, size) = match listed {
            Ok(listed) => listed,
            Err(e) => {
                printer.error("Failed", &e.to_string());
                failed += 1;
                continue;
            }
        };
        let size = match size {
            Some((w, h)) => format!("{}x{}", w, h),
            None => "unknown size".to_string(),
        };

        printer.info(
            "Image",
            &format!(
                "{} {}",
                display_path(file),
                printer.dim(&format!("({}, {})", size, plural(layers.len(), "layer", "layers")))
            ),
        );
        for layer in &layers {
            println!("{}  {}", layer.name, printer.dim(&layer.src));
        }
    }

    if failed > 0 {
        return Err(OraError::Build {
            message: format!("{} could not be read", plural(failed, "file", "files")),
            help: None,
        });
    }
    Ok(())
}
