//! Diagnostics printed for failed resolutions and merge problems.
//!
//! A diagnostic is a headline, an optional file or directory it points
//! at, `note:` lines naming the projects involved and `help:` lines with
//! the command that fixes it.

use std::path::PathBuf;

/// Help lines shared by several error types.
pub mod suggestions {
    pub const RUN_FETCH: &str = "run `quay fetch` to clone missing imports";

    pub const UNKNOWN_NAME: &str =
        "use a full git URL in the `git` field, or run `quay list registry` to see known names";

    pub const FETCH_FAILED: &str = "check the URL, the branch and your network connection";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn label(self, color: bool) -> &'static str {
        match (self, color) {
            (Severity::Error, false) => "error",
            (Severity::Warning, false) => "warning",
            (Severity::Error, true) => "\x1b[1;31merror\x1b[0m",
            (Severity::Warning, true) => "\x1b[1;33mwarning\x1b[0m",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    /// Manifest, project directory or exported path the problem is about
    pub location: Option<PathBuf>,
    pub notes: Vec<String>,
    pub help: Vec<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            message: message.into(),
            location: None,
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Warning, message)
    }

    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Add a help line unless the same text is already there.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        let help = help.into();
        if !self.help.contains(&help) {
            self.help.push(help);
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Render for stderr. Every line ends with a newline.
    pub fn format(&self, color: bool) -> String {
        let mut lines = vec![format!("{}: {}", self.severity.label(color), self.message)];
        if let Some(path) = &self.location {
            lines.push(format!("  --> {}", path.display()));
        }
        lines.extend(self.notes.iter().map(|note| format!("  note: {}", note)));
        lines.extend(self.help.iter().map(|help| format!("  help: {}", help)));

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
