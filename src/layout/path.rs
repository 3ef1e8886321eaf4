//! Output path templates.
//!
//! Paths name their artifacts with `[[token]]` placeholders. Text tokens
//! render slug-cleaned; a caret (`[[^token]]`) renders them title-cased.

use crate::types::{Direction, Mode, Size};

/// Values available to a path template.
#[derive(Debug, Clone)]
pub struct PathVars<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub theme: &'a str,
    pub input: &'a str,
    pub output: &'a str,
    pub template: &'a str,
    pub mode: Mode,
    pub direction: Direction,
    pub variant: String,
    pub image: String,
    pub group: String,
    pub frame: i64,
    pub frame_size: Size,
    pub image_size: Size,
}

impl PathVars<'_> {
    fn lookup(&self, token: &str) -> Option<String> {
        let (caret, key) = match token.strip_prefix('^') {
            Some(key) => (true, key),
            None => (false, token),
        };
        let text = |value: &str| if caret { title(value) } else { slug(value) };

        let value = match key {
            "name" => text(self.name),
            "version" => slug(self.version),
            "theme" => text(self.theme),
            "variant" => text(&self.variant),
            "input" => text(self.input),
            "output" => text(self.output),
            "image" => text(&self.image),
            "group" => text(&self.group),
            "template" => text(self.template),
            "mode" if caret => title(self.mode.as_str()),
            "mode" => self.mode.as_str().to_string(),
            "direction" if caret => title(self.direction.as_str()),
            "direction" => self.direction.as_str().to_string(),
            "frame" => self.frame.to_string(),
            "frame_width" => self.frame_size.0.to_string(),
            "frame_height" => self.frame_size.1.to_string(),
            "image_width" => self.image_size.0.to_string(),
            "image_height" => self.image_size.1.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Expand every `[[token]]` in one left-to-right pass. Unknown tokens and
/// unterminated brackets are kept as written.
pub fn expand(template: &str, vars: &PathVars<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("[[") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("]]") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let token = &after[..end];
        match vars.lookup(token) {
            Some(value) => out.push_str(&value),
            None => {
                out.push_str("[[");
                out.push_str(token);
                out.push_str("]]");
            }
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ' | '/' | '.' | '(' | ')' | '[' | ']')
}

/// Lowercase, strip disallowed characters, and turn spaces and hyphens into
/// underscores.
pub fn slug(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|c| is_path_char(*c))
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Strip disallowed characters and capitalise every word.
pub fn title(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = true;
    for c in value.chars().filter(|c| is_path_char(*c)) {
        if word_start {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
        word_start = matches!(c, ' ' | '-' | '_');
    }
    out
}
