//! Diagnostics collected while running a pipeline.
//!
//! A run never stops at a recoverable problem. Each skipped unit of work
//! leaves a diagnostic here, and the whole report is printed once the run
//! has finished.

use std::fmt;

use crate::output::{plural, Printer};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single run diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Machine-readable diagnostic code (e.g. "orasprite::input::path-not-found").
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            help: None,
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            help: None,
        }
    }

    /// Add help text to this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

/// Ordered diagnostics from one run.
#[derive(Debug, Clone, Default)]
pub struct Report {
    diagnostics: Vec<Diagnostic>,
    written: usize,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add an error diagnostic.
    pub fn error(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(Diagnostic::error(code, message));
    }

    /// Add a warning unless an identical one was already reported.
    pub fn warning_once(&mut self, code: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(code, message);
        if !self.diagnostics.contains(&diagnostic) {
            self.push(diagnostic);
        }
    }

    /// Count one artifact handed to the sink.
    pub fn count_written(&mut self) {
        self.written += 1;
    }

    /// Number of artifacts written during the run.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    /// Count errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Count warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Check if there are no diagnostics at all.
    pub fn is_ok(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Iterate over diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Error messages in the order they were recorded.
    pub fn messages(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }
}

/// Print every diagnostic followed by a one-line summary.
pub fn print_report(report: &Report, printer: &Printer) {
    if report.is_ok() {
        return;
    }

    eprintln!("The following issues came up:");
    for d in report.iter() {
        let label = printer.severity(&d.severity.to_string(), d.severity == Severity::Error);
        eprintln!("  {}[{}]: {}", label, d.code, d.message);
        if let Some(help) = &d.help {
            eprintln!("    {}: {}", printer.dim("help"), help);
        }
    }

    let summary = format!(
        "{}, {}",
        plural(report.error_count(), "error", "errors"),
        plural(report.warning_count(), "warning", "warnings")
    );
    if report.has_errors() {
        printer.error("Failed", &summary);
    } else {
        printer.warning("Finished", &summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = Report::new();
        assert!(report.is_ok());
        assert!(!report.has_errors());
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.warning_count(), 0);
        assert_eq!(report.written(), 0);
    }

    #[test]
    fn test_errors_keep_order() {
        let mut report = Report::new();
        report.error("orasprite::a", "first");
        report.error("orasprite::b", "second");

        assert!(report.has_errors());
        assert_eq!(report.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_warning_once_deduplicates() {
        let mut report = Report::new();
        report.warning_once("orasprite::layer", "Layer not found. (hat)");
        report.warning_once("orasprite::layer", "Layer not found. (hat)");
        report.warning_once("orasprite::layer", "Layer not found. (cape)");

        assert!(!report.has_errors());
        assert_eq!(report.warning_count(), 2);
    }

    #[test]
    fn test_repeated_errors_are_kept() {
        let mut report = Report::new();
        report.error("orasprite::padding", "Invalid padding. (sheets)");
        report.error("orasprite::padding", "Invalid padding. (sheets)");
        assert_eq!(report.error_count(), 2);
    }

    #[test]
    fn test_diagnostic_with_help() {
        let d = Diagnostic::error("orasprite::test", "missing template")
            .with_help("Add the template to the input's templates");
        assert_eq!(d.help.as_deref(), Some("Add the template to the input's templates"));
    }

    #[test]
    fn test_print_report_with_help() {
        let mut report = Report::new();
        report.push(
            Diagnostic::error("orasprite::template::not-found", "Template not found. (walk)")
                .with_help("Define it under the templates of input pad"),
        );
        report.warning_once("orasprite::layer::missing", "Layer not found. (hat)");

        print_report(&report, &Printer::new());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }
}
