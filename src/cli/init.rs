//! Init command implementation.
//!
//! Generates a starter `orasprite.json` from the OpenRaster files in a
//! directory.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::json;

use crate::config::CONFIG_FILENAME;
use crate::error::{OraError, Result};
use crate::output::{display_path, plural, Printer};

use super::layers::find_ora_files;

/// Input name used by the generated config.
const STARTER_INPUT: &str = "sprites";

/// Initialize an orasprite project (generates orasprite.json)
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to scan (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing orasprite.json
    #[arg(long)]
    pub force: bool,
}

/// How a found file is written into the config. `build` resolves input
/// paths from the working directory, so paths are kept relative to it.
fn input_path(file: &Path) -> String {
    let file = file.strip_prefix(".").unwrap_or(file);
    match std::env::current_dir() {
        Ok(cwd) => file.strip_prefix(&cwd).unwrap_or(file).display().to_string(),
        Err(_) => file.display().to_string(),
    }
}

/// Starter config: one input holding every found file, one output writing
/// a PNG per variant.
pub fn starter_config(root: &Path, files: &[PathBuf]) -> serde_json::Value {
    let name = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "sprites".to_string());

    let paths: Vec<String> = files.iter().map(|file| input_path(file)).collect();

    json!({
        "name": name,
        "inputs": {
            STARTER_INPUT: { "paths": paths }
        },
        "outputs": {
            "images": {
                "path": "dist/[[input]]/[[variant]]",
                "inputs": [STARTER_INPUT],
                "configs": [{ "mode": "images" }]
            }
        }
    })
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let config_path = args.path.join(CONFIG_FILENAME);

    if config_path.exists() && !args.force {
        return Err(OraError::Build {
            message: format!("{} already exists", CONFIG_FILENAME),
            help: Some("Use --force to overwrite".to_string()),
        });
    }

    printer.status("Scanning", &display_path(&args.path));
    let files = find_ora_files(std::slice::from_ref(&args.path));

    let config = starter_config(&args.path, &files);
    let content = serde_json::to_string_pretty(&config).map_err(|e| OraError::Build {
        message: format!("Failed to serialize config: {}", e),
        help: None,
    })?;

    fs::write(&config_path, content + "\n").map_err(|e| OraError::Io {
        path: config_path.clone(),
        message: format!("Failed to write config: {}", e),
    })?;

    printer.success(
        "Created",
        &format!("{} ({} found)", CONFIG_FILENAME, plural(files.len(), "image", "images")),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::source::fixtures::{solid, write_ora};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_init_creates_loadable_config() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("art")).unwrap();
        write_ora(&dir.path().join("art/hero.ora"), None, &[("idle", solid(2, 2, [0, 0, 0, 255]))]);

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: false,
        };
        run(args, &Printer::new()).unwrap();

        let config = Config::load(&dir.path().join(CONFIG_FILENAME)).unwrap();
        let inputs = config.inputs.unwrap();
        let input = inputs.get(STARTER_INPUT).unwrap();
        assert_eq!(input.paths.clone().unwrap(), vec![dir.path().join("art/hero.ora")]);

        let outputs = config.outputs.unwrap();
        assert!(outputs.get("images").unwrap().accepts(STARTER_INPUT));
    }

    #[test]
    fn test_init_errors_if_config_exists() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{}").unwrap();

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: false,
        };
        assert!(run(args, &Printer::new()).is_err());
    }

    #[test]
    fn test_init_force_overwrites() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{}").unwrap();

        let args = InitArgs {
            path: dir.path().to_path_buf(),
            force: true,
        };
        run(args, &Printer::new()).unwrap();

        let content = fs::read_to_string(dir.path().join(CONFIG_FILENAME)).unwrap();
        assert!(content.contains("[[variant]]"));
    }

    #[test]
    fn test_paths_resolve_from_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(input_path(&cwd.join("art/hero.ora")), "art/hero.ora");
        assert_eq!(input_path(Path::new("./art/hero.ora")), "art/hero.ora");
        assert_eq!(input_path(Path::new("game/art/hero.ora")), "game/art/hero.ora");
        assert_eq!(input_path(Path::new("/elsewhere/hero.ora")), "/elsewhere/hero.ora");
    }

    #[test]
    fn test_init_empty_directory() {
        let dir = tempdir().unwrap();
        let config = starter_config(dir.path(), &[]);
        assert_eq!(config["inputs"][STARTER_INPUT]["paths"], json!([]));
    }
}
