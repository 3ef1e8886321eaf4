//! Pipeline configuration (orasprite.json / orasprite.yaml).
//!
//! The config describes where layered source images live, how their layers
//! group into variants, the animation templates to render, palette themes,
//! and the outputs to produce. Loading only checks the shape of the file;
//! everything else is reported by the engine while it runs.

mod ordered;

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{OraError, Result};
use crate::types::PaddingSpec;

pub use ordered::OrderedMap;

/// Default config file name looked up by the CLI.
pub const CONFIG_FILENAME: &str = "orasprite.json";

/// Layer name that stands for the variant being rendered.
pub const CURRENT_VARIANT: &str = "*";

/// Root of a pipeline config.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project name, used by the `[[name]]` token.
    pub name: Option<String>,

    /// Project version, used by the `[[version]]` token. Falls back to `name`.
    pub version: Option<String>,

    pub inputs: Option<OrderedMap<Input>>,

    pub outputs: Option<OrderedMap<Output>>,

    /// Palette themes: theme name -> colour name -> destination hex.
    pub themes: Option<OrderedMap<OrderedMap<String>>>,
}

impl Config {
    /// Load a config file. `.yaml` and `.yml` files are read as YAML,
    /// everything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| OraError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::parse_yaml(&content),
            _ => Self::parse_json(&content),
        }
    }

    /// Parse a config from a JSON string.
    pub fn parse_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| OraError::Parse {
            message: format!("Invalid config: {}", e),
            help: Some("Check the JSON syntax of the config file".to_string()),
        })
    }

    /// Parse a config from a YAML string.
    pub fn parse_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| OraError::Parse {
            message: format!("Invalid config: {}", e),
            help: Some("Check the YAML syntax of the config file".to_string()),
        })
    }

    pub fn effective_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    pub fn effective_version(&self) -> &str {
        self.version.as_deref().unwrap_or_else(|| self.effective_name())
    }

    /// Colour table for a theme, if the config defines it.
    pub fn theme(&self, name: &str) -> Option<&OrderedMap<String>> {
        self.themes.as_ref().and_then(|themes| themes.get(name))
    }

    /// Every container path named by any input, in declaration order.
    pub fn input_paths(&self) -> Vec<PathBuf> {
        self.inputs
            .iter()
            .flat_map(|inputs| inputs.iter())
            .flat_map(|(_, input)| input.paths.iter().flatten().cloned())
            .collect()
    }
}

/// A set of layered source files and how to interpret their layers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Input {
    /// Container files, scanned in order. Later files win on layer name clashes.
    pub paths: Option<Vec<PathBuf>>,

    /// Variant groups. When absent, one group holding every discovered layer
    /// is created, named after the input.
    pub groups: Option<OrderedMap<Group>>,

    pub templates: OrderedMap<Template>,

    /// Named, reusable frame layer lists.
    pub frames: OrderedMap<Vec<FrameLayer>>,

    /// Source palette: colour name -> hex found in the layer images.
    pub colors: OrderedMap<String>,

    /// Variants never rendered.
    pub skip: Vec<String>,
}

impl Input {
    pub fn is_skipped(&self, variant: &str) -> bool {
        self.skip.iter().any(|s| s == variant)
    }
}

/// An ordered set of variants laid out together.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Group {
    pub variants: Vec<String>,

    /// Overrides the container's canvas size for every variant in the group.
    pub size: Option<[u32; 2]>,

    /// Layer aliases: alias -> layer, or alias -> variant -> layer.
    pub references: OrderedMap<Reference>,

    /// Start a fresh line in continuous sheets.
    #[serde(rename = "break")]
    pub breaks: bool,
}

impl Group {
    pub fn with_variants(variants: Vec<String>) -> Self {
        Self {
            variants,
            ..Default::default()
        }
    }
}

/// Target of a layer alias.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Reference {
    Layer(String),
    PerVariant(OrderedMap<String>),
}

/// An animation: an ordered list of frames.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Template {
    pub frames: Vec<Vec<FrameEntry>>,
}

impl Template {
    /// One frame showing the variant itself.
    pub fn single_frame() -> Self {
        Self {
            frames: vec![vec![FrameEntry::Named(CURRENT_VARIANT.to_string())]],
        }
    }
}

/// One entry of a template frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FrameEntry {
    /// A named frame list from the input's `frames`, or a plain layer name.
    Named(String),
    Layer(FrameLayer),
}

/// A layer placed in a frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrameLayer {
    #[serde(default = "default_layer")]
    pub layer: String,

    #[serde(default)]
    pub offset: [i64; 2],

    #[serde(default = "default_alpha")]
    pub alpha: f32,

    /// Only applies to these groups.
    #[serde(default)]
    pub groups: Option<Vec<String>>,

    /// Only applies to these variants.
    #[serde(default)]
    pub variants: Option<Vec<String>>,
}

impl FrameLayer {
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            offset: [0, 0],
            alpha: 1.0,
            groups: None,
            variants: None,
        }
    }

    /// Whether the group and variant filters admit this layer.
    pub fn applies_to(&self, group: &str, variant: &str) -> bool {
        let group_ok = self
            .groups
            .as_ref()
            .map_or(true, |groups| groups.iter().any(|g| g == group));
        let variant_ok = self
            .variants
            .as_ref()
            .map_or(true, |variants| variants.iter().any(|v| v == variant));
        group_ok && variant_ok
    }
}

fn default_layer() -> String {
    CURRENT_VARIANT.to_string()
}

fn default_alpha() -> f32 {
    1.0
}

/// A family of output artifacts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Output {
    /// Path template, e.g. `dist/[[input]]/[[variant]]`.
    pub path: String,

    /// Inputs this output renders.
    pub inputs: Vec<String>,

    /// Themes to render; empty means the implicit `default` theme.
    pub themes: Vec<String>,

    pub configs: Vec<OutputConfig>,
}

impl Output {
    pub fn accepts(&self, input: &str) -> bool {
        self.inputs.iter().any(|i| i == input)
    }

    pub fn effective_themes(&self) -> Vec<&str> {
        if self.themes.is_empty() {
            vec!["default"]
        } else {
            self.themes.iter().map(String::as_str).collect()
        }
    }
}

/// One independent layout pass of an output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// `images`, `frames`, `sheet` or `sheet_frames`; defaults to `images`.
    pub mode: Option<String>,

    /// Template name; defaults to a single frame of the variant.
    pub template: Option<String>,

    /// Appended to the output path.
    pub path: String,

    pub padding: PaddingSpec,

    /// `horizontal` or `vertical`; defaults to `horizontal`.
    pub direction: Option<String>,

    pub width: i64,
    pub height: i64,
    pub cols: i64,
    pub rows: i64,

    pub group_padding: bool,

    pub continuous: Continuous,

    pub start_index: i64,
}

/// Which groups of a tiled sheet keep packing on the current line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Continuous {
    All(bool),
    Groups(Vec<String>),
}

impl Default for Continuous {
    fn default() -> Self {
        Continuous::All(false)
    }
}

impl Continuous {
    pub fn applies_to(&self, group: &str) -> bool {
        match self {
            Continuous::All(flag) => *flag,
            Continuous::Groups(groups) => groups.iter().any(|g| g == group),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FULL: &str = r##"{
        "name": "Input Buttons",
        "themes": {
            "dark": { "face": "#202020", "shine": "#FFFFFF80" }
        },
        "inputs": {
            "buttons": {
                "paths": ["art/buttons.ora"],
                "colors": { "face": "#FF00FF" },
                "skip": ["unused"],
                "groups": {
                    "round": {
                        "variants": ["a", "b"],
                        "size": [16, 16],
                        "references": {
                            "shadow": "shadow-round",
                            "icon": { "a": "icon-a", "b": "*" }
                        }
                    },
                    "square": { "variants": ["x"], "break": true }
                },
                "frames": {
                    "pressed": [
                        { "layer": "shadow", "offset": [0, 1] },
                        { "layer": "*", "alpha": 0.5, "groups": ["round"] }
                    ]
                },
                "templates": {
                    "press": { "frames": [["*"], ["pressed", { "layer": "icon", "offset": [1, -1] }]] }
                }
            }
        },
        "outputs": {
            "sheets": {
                "path": "dist/[[input]]",
                "inputs": ["buttons"],
                "themes": ["dark"],
                "configs": [
                    { "mode": "sheet", "template": "press", "padding": [1, 2], "cols": 4, "continuous": ["round"] }
                ]
            }
        }
    }"##;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse_json(FULL).unwrap();

        assert_eq!(config.effective_name(), "Input Buttons");
        assert_eq!(config.effective_version(), "Input Buttons");
        assert_eq!(config.theme("dark").unwrap().get("shine").unwrap(), "#FFFFFF80");

        let input = config.inputs.as_ref().unwrap().get("buttons").unwrap();
        assert_eq!(input.paths.as_ref().unwrap(), &vec![PathBuf::from("art/buttons.ora")]);
        assert!(input.is_skipped("unused"));

        let groups = input.groups.as_ref().unwrap();
        let names: Vec<&str> = groups.keys().collect();
        assert_eq!(names, vec!["round", "square"]);

        let round = groups.get("round").unwrap();
        assert_eq!(round.size, Some([16, 16]));
        assert!(!round.breaks);
        assert_eq!(
            round.references.get("shadow"),
            Some(&Reference::Layer("shadow-round".to_string()))
        );
        assert!(matches!(round.references.get("icon"), Some(Reference::PerVariant(_))));
        assert!(groups.get("square").unwrap().breaks);

        let template = input.templates.get("press").unwrap();
        assert_eq!(template.frames.len(), 2);
        assert_eq!(template.frames[1][0], FrameEntry::Named("pressed".to_string()));
        match &template.frames[1][1] {
            FrameEntry::Layer(layer) => {
                assert_eq!(layer.layer, "icon");
                assert_eq!(layer.offset, [1, -1]);
                assert_eq!(layer.alpha, 1.0);
            }
            other => panic!("unexpected frame entry: {:?}", other),
        }

        let pressed = input.frames.get("pressed").unwrap();
        assert_eq!(pressed[1].layer, "*");
        assert_eq!(pressed[1].groups, Some(vec!["round".to_string()]));

        let output = config.outputs.as_ref().unwrap().get("sheets").unwrap();
        assert!(output.accepts("buttons"));
        let oc = &output.configs[0];
        assert_eq!(oc.mode.as_deref(), Some("sheet"));
        assert_eq!(oc.cols, 4);
        assert_eq!(oc.rows, 0);
        assert!(oc.continuous.applies_to("round"));
        assert!(!oc.continuous.applies_to("square"));
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
name: demo
version: "1.2"
inputs:
  main:
    paths: [a.ora]
outputs:
  out:
    path: dist/[[variant]]
    inputs: [main]
    configs:
      - mode: images
        padding: 2
"#;
        let config = Config::parse_yaml(yaml).unwrap();
        assert_eq!(config.effective_version(), "1.2");
        let output = config.outputs.as_ref().unwrap().get("out").unwrap();
        assert_eq!(output.effective_themes(), vec!["default"]);
        assert!(matches!(output.configs[0].padding, PaddingSpec::Uniform(2)));
    }

    #[test]
    fn test_missing_blocks_still_parse() {
        let config = Config::parse_json("{}").unwrap();
        assert!(config.inputs.is_none());
        assert!(config.outputs.is_none());
        assert_eq!(config.effective_name(), "unnamed");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let err = Config::parse_json("{ inputs: ").unwrap_err();
        assert!(matches!(err, OraError::Parse { .. }));
    }

    #[test]
    fn test_frame_layer_filters() {
        let mut layer = FrameLayer::new("*");
        assert!(layer.applies_to("g", "v"));

        layer.groups = Some(vec!["g".to_string()]);
        assert!(layer.applies_to("g", "v"));
        assert!(!layer.applies_to("h", "v"));

        layer.variants = Some(vec!["w".to_string()]);
        assert!(!layer.applies_to("g", "v"));
        assert!(layer.applies_to("g", "w"));
    }

    #[test]
    fn test_input_paths_in_order() {
        let config = Config::parse_json(
            r#"{ "inputs": { "b": { "paths": ["2.ora", "3.ora"] }, "a": { "paths": ["1.ora"] }, "c": {} } }"#,
        )
        .unwrap();
        assert_eq!(
            config.input_paths(),
            vec![PathBuf::from("2.ora"), PathBuf::from("3.ora"), PathBuf::from("1.ora")]
        );
    }

    #[test]
    fn test_load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sprites.yml");
        std::fs::write(&path, "name: from-yaml\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().effective_name(), "from-yaml");

        let missing = dir.path().join("missing.json");
        assert!(matches!(Config::load(&missing), Err(OraError::Io { .. })));
    }
}
