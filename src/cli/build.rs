//! Build command implementation.
//!
//! Loads a pipeline config, renders every output, and prints the collected
//! diagnostics once the run is over.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use notify::{RecursiveMode, Watcher};

use crate::config::{Config, CONFIG_FILENAME};
use crate::error::{OraError, Result};
use crate::layout::Engine;
use crate::output::{display_path, plural, Printer};
use crate::render::{DryRunSink, ImageSink, PngSink};
use crate::report::{print_report, Report};
use crate::source::OraSource;

/// Quiet period that closes a burst of file-system events.
const WATCH_SETTLE: Duration = Duration::from_millis(200);

/// Build sprites, frames and sheets from a pipeline config
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Config file (JSON, or YAML with a .yaml/.yml extension)
    #[arg(default_value = CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Render everything but only list the files that would be written
    #[arg(long)]
    pub dry_run: bool,

    /// Rebuild when the config or an input file changes
    #[arg(long)]
    pub watch: bool,
}

pub fn run(args: BuildArgs, printer: &Printer) -> Result<()> {
    let report = build_once(&args, printer)?;

    if args.watch {
        return watch(&args, printer);
    }

    if report.has_errors() {
        return Err(OraError::Build {
            message: format!("{} while building", plural(report.error_count(), "error", "errors")),
            help: None,
        });
    }
    Ok(())
}

/// Load the config and run the pipeline once.
pub fn build_once(args: &BuildArgs, printer: &Printer) -> Result<Report> {
    let config = Config::load(&args.config)?;
    printer.status(
        "Building",
        &format!("{} ({})", config.effective_name(), display_path(&args.config)),
    );

    let report = if args.dry_run {
        let (report, sink) = render(&config, DryRunSink::new());
        for (path, (width, height)) in sink.planned() {
            let size = printer.dim(&format!("({}x{})", width, height));
            printer.info("Would write", &format!("{} {}", display_path(path), size));
        }
        report
    } else {
        render(&config, PngSink).0
    };

    print_report(&report, printer);
    if !report.has_errors() {
        let verb = if args.dry_run { "Checked" } else { "Finished" };
        printer.success(verb, &plural(report.written(), "image", "images"));
    }
    Ok(report)
}

fn render<K: ImageSink>(config: &Config, sink: K) -> (Report, K) {
    let spinner = spinner();
    let mut engine = Engine::new(OraSource::new(), sink);
    let report = engine.run_with(config, &mut |path: &Path| {
        spinner.set_message(display_path(path))
    });
    spinner.finish_and_clear();
    (report, engine.into_parts().1)
}

fn spinner() -> ProgressBar {
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Paths whose changes trigger a rebuild: the config and every input file.
fn watch_paths(config_path: &Path) -> Vec<PathBuf> {
    let mut paths = vec![config_path.to_path_buf()];
    if let Ok(config) = Config::load(config_path) {
        for path in config.input_paths() {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

fn watch(args: &BuildArgs, printer: &Printer) -> Result<()> {
    let watch_error = |e: notify::Error| OraError::Build {
        message: format!("Failed to watch for changes: {}", e),
        help: None,
    };

    let (tx, rx) = channel::<notify::Result<notify::Event>>();
    let mut watcher = notify::recommended_watcher(tx).map_err(watch_error)?;
    let mut watched = watch_paths(&args.config);
    for path in &watched {
        if path.exists() {
            watcher
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(watch_error)?;
        }
    }
    printer.info("Watching", &plural(watched.len(), "file", "files"));

    while let Ok(event) = rx.recv() {
        if event.is_err() {
            continue;
        }

        // Let editors finish writing before rebuilding.
        loop {
            match rx.recv_timeout(WATCH_SETTLE) {
                Ok(_) => continue,
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }

        if let Err(e) = build_once(args, printer) {
            printer.error("Failed", &e.to_string());
        }

        // The config may name new inputs.
        for path in watch_paths(&args.config) {
            if !watched.contains(&path) && path.exists() {
                watcher
                    .watch(&path, RecursiveMode::NonRecursive)
                    .map_err(watch_error)?;
                watched.push(path);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fixtures::{solid, write_ora};
    use std::fs;
    use tempfile::tempdir;

    fn project(dir: &Path) -> PathBuf {
        write_ora(
            &dir.join("buttons.ora"),
            None,
            &[("a", solid(4, 4, [255, 0, 0, 255])), ("b", solid(4, 4, [0, 255, 0, 255]))],
        );

        let config = serde_json::json!({
            "name": "buttons",
            "inputs": { "pad": { "paths": [dir.join("buttons.ora")] } },
            "outputs": {
                "png": {
                    "path": dir.join("dist").join("[[variant]]"),
                    "inputs": ["pad"],
                    "configs": [{}]
                }
            }
        });
        let path = dir.join(CONFIG_FILENAME);
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_build_writes_pngs() {
        let dir = tempdir().unwrap();
        let config = project(dir.path());

        let args = BuildArgs {
            config,
            dry_run: false,
            watch: false,
        };
        run(args, &Printer::new()).unwrap();

        let a = image::open(dir.path().join("dist/a.png")).unwrap().to_rgba8();
        assert_eq!(a.dimensions(), (4, 4));
        assert_eq!(a.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert!(dir.path().join("dist/b.png").exists());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let config = project(dir.path());

        let args = BuildArgs {
            config,
            dry_run: true,
            watch: false,
        };
        let report = build_once(&args, &Printer::new()).unwrap();

        assert_eq!(report.written(), 2);
        assert!(!dir.path().join("dist").exists());
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let dir = tempdir().unwrap();
        let args = BuildArgs {
            config: dir.path().join("nope.json"),
            dry_run: false,
            watch: false,
        };
        assert!(run(args, &Printer::new()).is_err());
    }

    #[test]
    fn test_run_fails_when_report_has_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, r#"{ "outputs": {} }"#).unwrap();

        let args = BuildArgs {
            config: path,
            dry_run: false,
            watch: false,
        };
        let err = run(args, &Printer::new()).unwrap_err();
        assert!(err.to_string().contains("1 error"));
    }

    #[test]
    fn test_watch_paths_include_inputs_once() {
        let dir = tempdir().unwrap();
        let config = project(dir.path());

        let paths = watch_paths(&config);
        assert_eq!(paths, vec![config.clone(), dir.path().join("buttons.ora")]);
    }
}
