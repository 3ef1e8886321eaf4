//! Layout engine.
//!
//! The engine walks every output × theme × input × output config of a
//! [`Config`], composites each variant's frames from its layers, places the
//! results as single images, frame sequences or sheets, and hands them to an
//! [`ImageSink`]. Recoverable problems are collected in a [`Report`] and the
//! run carries on with the next unit of work.

mod frames;
mod job;
mod path;
mod sheet;
mod size;

use std::path::Path;

use image::RgbaImage;

use crate::config::{Config, Group, Input, OrderedMap, OutputConfig, Template};
use crate::error::OraError;
use crate::render::{blend_in_place, new_canvas, ColourMap, ImageSink};
use crate::report::{Diagnostic, Report};
use crate::source::{LayerMap, LayerSource};
use crate::types::{Mode, Padding, Size};

pub use frames::{eligible_variants, resolve_frames, resolve_reference, ResolvedLayer};
pub use job::{Job, PreparedInput, Settings, SheetLead};
pub use path::{expand, slug, title, PathVars};
pub use sheet::{DirectionalSheet, TiledSheet};
pub use size::{canvas_size, frame_cell, padded_size, Sizer};

/// A composited variant.
#[derive(Debug)]
struct Rendered {
    image: RgbaImage,
    /// Padded size of a single frame.
    frame_size: Size,
}

/// Runs configs against a layer source and an image sink.
pub struct Engine<S, K> {
    source: S,
    sink: K,
}

impl<S: LayerSource, K: ImageSink> Engine<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self { source, sink }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Render every output of `config`.
    pub fn run(&mut self, config: &Config) -> Report {
        self.run_with(config, &mut |_: &Path| {})
    }

    /// Like [`Engine::run`], calling `on_write` with each artifact path as it
    /// is written.
    pub fn run_with(&mut self, config: &Config, on_write: &mut dyn FnMut(&Path)) -> Report {
        self.source.reset();

        let mut run = Run {
            source: &mut self.source,
            sink: &mut self.sink,
            layer_map: LayerMap::new(),
            report: Report::new(),
            on_write,
        };
        run.execute(config);
        run.report
    }
}

/// State of one run. Only the layer map and the report outlive a single
/// output config.
struct Run<'r> {
    source: &'r mut dyn LayerSource,
    sink: &'r mut dyn ImageSink,
    layer_map: LayerMap,
    report: Report,
    on_write: &'r mut dyn FnMut(&Path),
}

impl Run<'_> {
    fn execute(&mut self, config: &Config) {
        let Some(inputs) = &config.inputs else {
            self.report.error("orasprite::config::missing", "No inputs found in config.");
            return;
        };
        let Some(outputs) = &config.outputs else {
            self.report.error("orasprite::config::missing", "No outputs found in config.");
            return;
        };

        let prepared = self.prepare_inputs(inputs);

        for (output_name, output) in outputs.iter() {
            for theme_name in output.effective_themes() {
                for input in prepared.iter().filter(|p| output.accepts(p.name)) {
                    let colours = match config.theme(theme_name) {
                        Some(theme) => match ColourMap::build(theme, &input.input.colors) {
                            Ok(colours) => colours,
                            Err(e) => {
                                self.report.error(
                                    "orasprite::theme::invalid-colour",
                                    format!("{} (theme {}, input {})", e, theme_name, input.name),
                                );
                                continue;
                            }
                        },
                        None => ColourMap::new(),
                    };

                    for output_config in &output.configs {
                        let scope = Scope {
                            config,
                            output: output_name,
                            output_path: &output.path,
                            theme: theme_name,
                            input,
                            colours: &colours,
                        };
                        self.render_config(&scope, output_config);
                    }
                }
            }
        }
    }

    /// Scan every input path into the layer map and settle each input's
    /// groups. Inputs without paths are left out.
    fn prepare_inputs<'c>(&mut self, inputs: &'c OrderedMap<Input>) -> Vec<PreparedInput<'c>> {
        let mut prepared = Vec::new();

        for (name, input) in inputs.iter() {
            let Some(paths) = &input.paths else {
                continue;
            };

            let mut discovered: Vec<String> = Vec::new();
            for path in paths {
                if !self.source.exists(path) {
                    self.report.push(
                        Diagnostic::error(
                            "orasprite::input::not-found",
                            format!("Input path not found. ({})", path.display()),
                        )
                        .with_help("Input paths are resolved from the working directory"),
                    );
                    continue;
                }
                match self.source.list_layers(path) {
                    Ok(entries) => {
                        self.layer_map.insert_container(path, &entries);
                        for entry in entries {
                            if !discovered.contains(&entry.name) {
                                discovered.push(entry.name);
                            }
                        }
                    }
                    Err(e) => self.report.error("orasprite::input::unreadable", e.to_string()),
                }
            }

            let groups = match &input.groups {
                Some(groups) => groups.clone(),
                None => [(name, Group::with_variants(discovered))].into_iter().collect(),
            };
            prepared.push(PreparedInput { name, input, groups });
        }

        prepared
    }

    fn render_config(&mut self, scope: &Scope<'_>, output_config: &OutputConfig) {
        let mut settings = match Settings::from_config(output_config, Padding::default()) {
            Ok(settings) => settings,
            Err(e) => {
                self.report.error("orasprite::config::invalid", e.to_string());
                return;
            }
        };

        let single_frame;
        let (template_name, template) = match &output_config.template {
            Some(name) => match scope.input.input.templates.get(name) {
                Some(template) => (name.as_str(), template),
                None => {
                    self.report.push(
                        Diagnostic::error(
                            "orasprite::template::not-found",
                            format!("Template not found. ({})", name),
                        )
                        .with_help(format!(
                            "Define it under the templates of input {}",
                            scope.input.name
                        )),
                    );
                    return;
                }
            },
            None => {
                single_frame = Template::single_frame();
                ("default", &single_frame)
            }
        };

        settings.padding = match Padding::from_spec(&output_config.padding) {
            Ok(padding) => padding,
            Err(e) => {
                let help = match e {
                    OraError::Parse { help: Some(help), .. } => help,
                    other => other.to_string(),
                };
                self.report.push(
                    Diagnostic::error(
                        "orasprite::config::invalid-padding",
                        format!("Invalid padding. ({})", scope.output),
                    )
                    .with_help(help),
                );
                Padding::default()
            }
        };

        let job = Job {
            project: scope.config.effective_name(),
            version: scope.config.effective_version(),
            output: scope.output,
            theme: scope.theme,
            input: scope.input,
            colours: scope.colours,
            template_name,
            template,
            settings,
            path: format!("{}{}", scope.output_path, output_config.path),
        };

        match job.settings.mode {
            Mode::Images => self.output_images(&job),
            Mode::Frames => self.output_frames(&job),
            Mode::Sheet => self.output_sheet(&job, None),
            Mode::SheetFrames => {
                for frame in 0..job.template.frames.len() {
                    self.output_sheet(&job, Some(frame));
                }
            }
        }
    }

    /// Composite one variant: every template frame, or only `frame`.
    ///
    /// Returns `None` when there is nothing to draw. Errors are recorded.
    fn render_variant(
        &mut self,
        job: &Job<'_>,
        group_name: &str,
        group: &Group,
        variant: &str,
        frame: Option<usize>,
    ) -> Option<Rendered> {
        let frames = match frame {
            Some(index) => job.template.frames.get(index..=index)?,
            None => job.template.frames.as_slice(),
        };
        let resolved = resolve_frames(
            group_name,
            variant,
            frames,
            &job.input.input.frames,
            &group.references,
        );
        if resolved.is_empty() {
            return None;
        }

        let intrinsic = {
            let sizer = Sizer {
                layer_map: &self.layer_map,
                input: job.input.input,
                groups: job.groups(),
                settings: &job.settings,
                frames_per_image: 1,
            };
            match sizer.intrinsic_size(&mut *self.source, variant) {
                Ok(Some(size)) => size,
                Ok(None) => return None,
                Err(e) => {
                    self.report.error("orasprite::variant::size", e.to_string());
                    return None;
                }
            }
        };

        let settings = &job.settings;
        let cell = padded_size(intrinsic, settings, 1);
        let size = canvas_size(settings, intrinsic, resolved.len());
        if size.0 == 0 || size.1 == 0 {
            return None;
        }
        let mut canvas = new_canvas(size);

        for (index, layers) in resolved.iter().enumerate() {
            let (col, row) = frame_cell(index, size, cell, settings.direction);
            let origin = (
                i64::from(col) * i64::from(cell.0) + i64::from(settings.padding.left),
                i64::from(row) * i64::from(cell.1) + i64::from(settings.padding.top),
            );

            for layer in layers {
                let Some(location) = self.layer_map.get(&layer.layer) else {
                    self.report.warning_once(
                        "orasprite::layer::missing",
                        format!("Layer not found. ({})", layer.layer),
                    );
                    continue;
                };
                let mut bitmap = match self.source.decode(&location.path, &location.src) {
                    Ok(bitmap) => bitmap,
                    Err(e) => {
                        self.report.error("orasprite::layer::decode", e.to_string());
                        continue;
                    }
                };
                job.colours.apply(&mut bitmap, layer.alpha);
                blend_in_place(
                    &mut canvas,
                    &bitmap,
                    (origin.0 + layer.offset.0, origin.1 + layer.offset.1),
                );
            }
        }

        Some(Rendered {
            image: canvas,
            frame_size: cell,
        })
    }

    fn write(&mut self, job: &Job<'_>, vars: &PathVars<'_>, image: &RgbaImage) {
        let path = job.artifact_path(vars);
        let written = self
            .sink
            .ensure_directory(&path)
            .and_then(|()| self.sink.write_png(&path, image));

        match written {
            Ok(()) => {
                self.report.count_written();
                (self.on_write)(&path);
            }
            Err(e) => self.report.error("orasprite::output::write", e.to_string()),
        }
    }

    fn variant_vars<'j>(
        &self,
        job: &'j Job<'_>,
        group: &str,
        variant: &str,
        rendered: &Rendered,
    ) -> PathVars<'j> {
        PathVars {
            variant: variant.to_string(),
            image: self.layer_map.image_stem(variant).unwrap_or_default(),
            group: group.to_string(),
            frame_size: rendered.frame_size,
            image_size: rendered.image.dimensions(),
            ..job.vars()
        }
    }

    fn output_images(&mut self, job: &Job<'_>) {
        for (group_name, group) in job.groups().iter() {
            for variant in eligible_variants(job.input.input, group, &self.layer_map) {
                let rendered = self.render_variant(job, group_name, group, &variant, None);
                let Some(rendered) = rendered else {
                    continue;
                };
                let vars = self.variant_vars(job, group_name, &variant, &rendered);
                self.write(job, &vars, &rendered.image);
            }
        }
    }

    fn output_frames(&mut self, job: &Job<'_>) {
        for (group_name, group) in job.groups().iter() {
            for variant in eligible_variants(job.input.input, group, &self.layer_map) {
                for frame in 0..job.template.frames.len() {
                    let rendered =
                        self.render_variant(job, group_name, group, &variant, Some(frame));
                    let Some(rendered) = rendered else {
                        continue;
                    };
                    let vars = PathVars {
                        frame: job.settings.frame_index(frame),
                        ..self.variant_vars(job, group_name, &variant, &rendered)
                    };
                    self.write(job, &vars, &rendered.image);
                }
            }
        }
    }

    /// One sheet (or one per group) holding every variant, either with all
    /// template frames or only `frame`.
    fn output_sheet(&mut self, job: &Job<'_>, frame: Option<usize>) {
        let frames_per_image = match frame {
            Some(_) => 1,
            None => job.template.frames.len(),
        };
        let tiled = !job.settings.bounds.is_unbounded();

        match (job.is_split(), tiled) {
            (true, false) => self.split_directional(job, frame),
            (false, false) => self.grouped_directional(job, frame),
            (true, true) => self.split_tiled(job, frame, frames_per_image),
            (false, true) => self.grouped_tiled(job, frame, frames_per_image),
        }
    }

    fn write_sheet(
        &mut self,
        job: &Job<'_>,
        frame: Option<usize>,
        group: &str,
        lead: &SheetLead,
        image: &RgbaImage,
    ) {
        let vars = PathVars {
            variant: job.input.name.to_string(),
            image: lead.image.clone(),
            group: group.to_string(),
            frame: job.settings.frame_index(frame.unwrap_or(0)),
            frame_size: lead.frame_size,
            image_size: image.dimensions(),
            ..job.vars()
        };
        self.write(job, &vars, image);
    }

    fn lead(&self, variant: &str, rendered: &Rendered) -> SheetLead {
        SheetLead {
            image: self.layer_map.image_stem(variant).unwrap_or_default(),
            frame_size: rendered.frame_size,
        }
    }

    fn split_directional(&mut self, job: &Job<'_>, frame: Option<usize>) {
        for (group_name, group) in job.groups().iter() {
            let mut sheet = DirectionalSheet::new(job.settings.direction);
            let mut lead: Option<SheetLead> = None;

            for variant in eligible_variants(job.input.input, group, &self.layer_map) {
                let rendered = self.render_variant(job, group_name, group, &variant, frame);
                let Some(rendered) = rendered else {
                    continue;
                };
                if lead.is_none() {
                    lead = Some(self.lead(&variant, &rendered));
                }
                sheet.push(&rendered.image);
            }

            if let (Some(image), Some(lead)) = (sheet.finish(), lead) {
                self.write_sheet(job, frame, group_name, &lead, &image);
            }
        }
    }

    fn grouped_directional(&mut self, job: &Job<'_>, frame: Option<usize>) {
        let mut sheet = DirectionalSheet::new(job.settings.direction);
        let mut lead: Option<SheetLead> = None;
        let mut last_group = "";

        for (group_name, group) in job.groups().iter() {
            last_group = group_name;
            let mut first_in_group = true;

            for variant in eligible_variants(job.input.input, group, &self.layer_map) {
                let rendered = self.render_variant(job, group_name, group, &variant, frame);
                let Some(rendered) = rendered else {
                    continue;
                };
                if first_in_group && job.settings.group_padding {
                    sheet.pad_to_grid(rendered.frame_size);
                }
                first_in_group = false;
                if lead.is_none() {
                    lead = Some(self.lead(&variant, &rendered));
                }
                sheet.push(&rendered.image);
            }
        }

        if let (Some(image), Some(lead)) = (sheet.finish(), lead) {
            self.write_sheet(job, frame, last_group, &lead, &image);
        }
    }

    fn tiling_size(
        &mut self,
        job: &Job<'_>,
        group: Option<&str>,
        frames_per_image: usize,
    ) -> Option<Size> {
        let sizer = Sizer {
            layer_map: &self.layer_map,
            input: job.input.input,
            groups: job.groups(),
            settings: &job.settings,
            frames_per_image,
        };
        match sizer.tiling_size(&mut *self.source, group) {
            Ok(size) => size,
            Err(e) => {
                self.report.error("orasprite::variant::size", e.to_string());
                None
            }
        }
    }

    fn split_tiled(&mut self, job: &Job<'_>, frame: Option<usize>, frames_per_image: usize) {
        for (group_name, group) in job.groups().iter() {
            let Some(bound) = self.tiling_size(job, Some(group_name), frames_per_image) else {
                continue;
            };
            let mut sheet = TiledSheet::new(bound, &job.settings.bounds, job.settings.direction);
            let mut lead: Option<SheetLead> = None;

            for variant in eligible_variants(job.input.input, group, &self.layer_map) {
                let rendered = self.render_variant(job, group_name, group, &variant, frame);
                let Some(rendered) = rendered else {
                    continue;
                };
                if lead.is_none() {
                    lead = Some(self.lead(&variant, &rendered));
                }
                sheet.place(&rendered.image);
            }

            if let (Some(image), Some(lead)) = (sheet.finish(), lead) {
                self.write_sheet(job, frame, group_name, &lead, &image);
            }
        }
    }

    fn grouped_tiled(&mut self, job: &Job<'_>, frame: Option<usize>, frames_per_image: usize) {
        let Some(bound) = self.tiling_size(job, None, frames_per_image) else {
            return;
        };
        let settings = &job.settings;
        let mut sheet = TiledSheet::new(bound, &settings.bounds, settings.direction);
        let mut lead: Option<SheetLead> = None;
        let mut last_group = "";

        for (group_name, group) in job.groups().iter() {
            last_group = group_name;
            let mut first_in_group = true;

            for variant in eligible_variants(job.input.input, group, &self.layer_map) {
                let rendered = self.render_variant(job, group_name, group, &variant, frame);
                let Some(rendered) = rendered else {
                    continue;
                };
                if first_in_group {
                    let continuous = settings.continuous.applies_to(group_name) && !group.breaks;
                    let snap = settings.group_padding.then_some(rendered.frame_size);
                    sheet.start_group(rendered.image.dimensions(), continuous, snap);
                }
                first_in_group = false;
                if lead.is_none() {
                    lead = Some(self.lead(&variant, &rendered));
                }
                sheet.place(&rendered.image);
            }
        }

        if let (Some(image), Some(lead)) = (sheet.finish(), lead) {
            self.write_sheet(job, frame, last_group, &lead, &image);
        }
    }
}

/// Where a config sits in the iteration.
struct Scope<'a> {
    config: &'a Config,
    output: &'a str,
    output_path: &'a str,
    theme: &'a str,
    input: &'a PreparedInput<'a>,
    colours: &'a ColourMap,
}
