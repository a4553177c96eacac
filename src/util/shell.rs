//! Terminal output of quay commands.
//!
//! Status lines and diagnostics go to stderr; listings and JSON documents
//! go to stdout. `--quiet` keeps errors only. In JSON mode stdout stays
//! machine readable: status lines and warnings are dropped and errors are
//! printed as `{"reason": "error", ...}` documents.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::util::diagnostic::Diagnostic;

/// Width of the right-aligned status column.
const STATUS_WIDTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    /// Status lines and a spinner while cloning
    Normal,
    /// Status lines without spinners, debug logging
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChoice {
    /// Color when stderr is a terminal
    Auto,
    Always,
    Never,
}

/// Verb shown in the status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Cloning,
    Fetching,
    Cloned,
    Created,
    Generated,
    Finished,
    Fresh,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Cloning => "Cloning",
            Status::Fetching => "Fetching",
            Status::Cloned => "Cloned",
            Status::Created => "Created",
            Status::Generated => "Generated",
            Status::Finished => "Finished",
            Status::Fresh => "Fresh",
            Status::Info => "Info",
        }
    }

    /// Cyan while working, green when something was produced, blue otherwise.
    fn color_code(self) -> &'static str {
        match self {
            Status::Cloning | Status::Fetching => "\x1b[1;36m",
            Status::Cloned | Status::Created | Status::Generated | Status::Finished => {
                "\x1b[1;32m"
            }
            Status::Fresh | Status::Info => "\x1b[1;34m",
        }
    }
}

#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
}

impl Shell {
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell { mode, use_color }
    }

    /// Shell for the global CLI flags. JSON output wins over `--quiet`
    /// and `--verbose`.
    pub fn from_flags(quiet: bool, verbose: bool, color: ColorChoice, json: bool) -> Self {
        if json {
            return Shell::new(ShellMode::Json);
        }

        let verbosity = match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        };
        Shell::new(ShellMode::Human { verbosity, color })
    }

    fn verbosity(&self) -> Option<Verbosity> {
        match self.mode {
            ShellMode::Human { verbosity, .. } => Some(verbosity),
            ShellMode::Json => None,
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.verbosity() == Some(Verbosity::Quiet)
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity() == Some(Verbosity::Verbose)
    }

    pub fn is_json(&self) -> bool {
        self.mode == ShellMode::Json
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print `{status:>12} {message}` to stderr unless quiet or JSON.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.verbosity().is_some_and(|v| v != Verbosity::Quiet) {
            eprintln!("{} {}", self.format_status(status), msg);
        }
    }

    pub fn note(&self, msg: impl Display) {
        self.status(Status::Info, msg);
    }

    /// Print a diagnostic.
    ///
    /// Warnings are dropped in quiet and JSON mode; errors are always shown.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) {
        match self.verbosity() {
            None if diagnostic.is_error() => self.print_json(&serde_json::json!({
                "reason": "error",
                "message": diagnostic.message,
                "notes": diagnostic.notes,
            })),
            None => {}
            Some(Verbosity::Quiet) if !diagnostic.is_error() => {}
            Some(_) => eprint!("{}", diagnostic.format(self.use_color)),
        }
    }

    /// Print a line of a listing to stdout (human mode only).
    pub fn println(&self, line: impl Display) {
        if !self.is_json() {
            println!("{}", line);
        }
    }

    /// Print a value as pretty JSON to stdout (JSON mode only).
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        if !self.is_json() {
            return;
        }

        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("failed to serialize JSON output: {}", e),
        }
        let _ = io::stdout().flush();
    }

    fn format_status(&self, status: Status) -> String {
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                status.label(),
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", status.label(), width = STATUS_WIDTH)
        }
    }

    /// Spinner shown while a clone runs.
    ///
    /// Only drawn in normal verbosity on a terminal; otherwise a no-op.
    pub fn spinner(&self, msg: impl Display) -> Spinner {
        let visible =
            self.verbosity() == Some(Verbosity::Normal) && io::stderr().is_terminal();

        let pb = visible.then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
                pb.set_style(style);
            }
            pb.set_message(msg.to_string());
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        Spinner { pb }
    }
}

/// Cleared when finished or dropped, so a failed clone leaves no spinner behind.
pub struct Spinner {
    pb: Option<ProgressBar>,
}

impl Spinner {
    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.finish();
    }
}
