//! Import and toolchain diagnostics.
//!
//! ## Usage
//!
//! ```bash
//! quay diag imports   # Missing projects, cycles, merge collisions
//! quay diag tools     # git, cmake, ninja, make
//! ```

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process::Command;

use crate::core::Workspace;
use crate::resolver::{merge, walk, ImportError, Registry};

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Related path (tool location or expected project directory)
    pub path: Option<PathBuf>,

    /// Version string (if applicable)
    pub version: Option<String>,

    /// Whether this check is required or optional
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            path: None,
            version: None,
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            passed: false,
            ..Self::pass(name, message)
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the related path.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = Some(path);
        self
    }

    /// Set the version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// A list of checks.
#[derive(Debug, Clone, Default)]
pub struct DiagReport {
    pub checks: Vec<CheckResult>,
}

impl DiagReport {
    /// Create a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result.
    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Check the import graph of the workspace.
///
/// Missing projects fail the report. Cycles and merge warnings are
/// reported as optional failures since generation still succeeds with them.
pub fn diag_imports(ws: &Workspace, registry: &Registry) -> Result<DiagReport, ImportError> {
    let graph = walk(ws, registry)?;
    let mut report = DiagReport::new();

    if graph.is_complete() {
        report.add(CheckResult::pass(
            "imports",
            format!("{} project(s) on disk", graph.len()),
        ));
    }
    for missing in graph.missing() {
        report.add(
            CheckResult::fail(
                missing.name.clone(),
                format!(
                    "not fetched (imported by `{}` from {}), run `quay fetch`",
                    missing.importer, missing.location
                ),
            )
            .with_path(missing.expected_dir.clone()),
        );
    }

    let cycles = graph.cycles();
    if cycles.is_empty() {
        report.add(CheckResult::pass("cycles", "no import cycles"));
    }
    for cycle in cycles {
        let mut path = cycle.clone();
        if let Some(first) = cycle.first() {
            path.push(first.clone());
        }
        report.add(
            CheckResult::fail("cycle", format!("import cycle: {}", path.join(" -> "))).optional(),
        );
    }

    if let Some(merged) = merge(&graph) {
        if merged.warnings.is_empty() {
            report.add(CheckResult::pass("exports", "no export collisions"));
        }
        for warning in &merged.warnings {
            report.add(CheckResult::fail("exports", warning.to_string()).optional());
        }
    }

    Ok(report)
}

/// Locate the tools a quay workspace is built with.
pub fn diag_tools() -> DiagReport {
    let mut report = DiagReport::new();
    report.add(check_tool("git", "required to fetch imports"));
    report.add(check_tool("cmake", "required to build the generated configuration"));
    report.add(check_tool("ninja", "optional build tool").optional());
    report.add(check_tool("make", "optional build tool").optional());
    report
}

/// Check that a tool is on PATH and record its version.
fn check_tool(name: &str, purpose: &str) -> CheckResult {
    let path = match which::which(name) {
        Ok(path) => path,
        Err(_) => return CheckResult::fail(name, format!("not found ({})", purpose)),
    };

    let result = CheckResult::pass(name, format!("found {}", name)).with_path(path);
    match tool_version(name) {
        Some(version) => result.with_version(version),
        None => result,
    }
}

/// First line of `<tool> --version`.
fn tool_version(name: &str) -> Option<String> {
    let output = Command::new(name).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Format a report for display.
pub fn format_report(title: &str, report: &DiagReport, verbose: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{}", title);
    let _ = writeln!(output, "{}\n", "=".repeat(title.len()));

    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };
        let _ = writeln!(output, "  {} {}{}: {}", status, check.name, required, check.message);

        if verbose || !check.passed {
            if let Some(path) = &check.path {
                let _ = writeln!(output, "      Path: {}", path.display());
            }
        }
        if verbose {
            if let Some(version) = &check.version {
                let _ = writeln!(output, "      Version: {}", version);
            }
        }
    }

    let _ = writeln!(
        output,
        "\nSummary: {} passed, {} failed",
        report.passed_count(),
        report.failed_count()
    );
    if report.required_failed_count() > 0 {
        let _ = writeln!(
            output,
            "{} required check(s) failed.",
            report.required_failed_count()
        );
    }

    output
}
