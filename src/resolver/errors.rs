//! Import resolution error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// A project that an import points at but which is not on disk yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingProject {
    /// Canonical project name
    pub name: String,
    /// Source location the project would be cloned from
    pub location: String,
    /// Project whose manifest declares the import
    pub importer: String,
    /// Where the project is expected on disk
    pub expected_dir: PathBuf,
}

impl MissingProject {
    /// One line naming the importer, source and expected directory.
    pub fn summary(&self) -> String {
        format!(
            "`{}` (imported by `{}` from {}) expected at {}",
            self.name,
            self.importer,
            self.location,
            self.expected_dir.display()
        )
    }

    /// Warning pointing at the directory the project should be cloned into.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::warning(format!("project `{}` has not been fetched", self.name))
            .with_location(&self.expected_dir)
            .with_note(format!("imported by `{}` from {}", self.importer, self.location))
            .with_help(suggestions::RUN_FETCH)
    }
}

/// Fatal error while loading manifests or resolving imports.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ImportError {
    #[error("failed to parse manifest {}: {message}", path.display())]
    #[diagnostic(
        code(quay::manifest::parse),
        help("Fix the manifest syntax; no partial manifests are accepted")
    )]
    ManifestParse { path: PathBuf, message: String },

    #[error("`{}` is not a valid project: {reason}", dir.display())]
    #[diagnostic(code(quay::project::invalid))]
    InvalidProject { dir: PathBuf, reason: String },

    #[error("could not find Quay.toml in {} or any parent directory", dir.display())]
    #[diagnostic(code(quay::project::not_found), help("Run `quay init` to create one"))]
    NotInProject { dir: PathBuf },

    #[error("import `{import}` in project `{project}` has no source location")]
    #[diagnostic(
        code(quay::manifest::missing_source),
        help("Add a `git = \"<url or registry name>\"` field to the import")
    )]
    MissingSourceLocation { project: String, import: String },

    #[error("`{name}` is neither a source URL nor a known registry name")]
    #[diagnostic(code(quay::registry::unknown_name))]
    UnknownRegistryName { name: String },

    #[error("import `{import}` in project `{project}` resolves to `{location}`: {reason}")]
    #[diagnostic(code(quay::import::invalid))]
    InvalidImport {
        project: String,
        import: String,
        location: String,
        reason: String,
    },

    #[error("cannot resolve import `{import}` of project `{project}`")]
    #[diagnostic(code(quay::import::unresolved))]
    Unresolved {
        project: String,
        import: String,
        #[source]
        source: Box<ImportError>,
    },

    #[error("{} imported project(s) have not been fetched: {}", missing.len(), missing_names(missing))]
    #[diagnostic(code(quay::import::incomplete), help("Run `quay fetch` first"))]
    IncompleteGraph { missing: Vec<MissingProject> },

    #[error("failed to parse registry {}: {message}", path.display())]
    #[diagnostic(code(quay::registry::parse))]
    RegistryParse { path: PathBuf, message: String },

    #[error("failed to read {}", path.display())]
    #[diagnostic(code(quay::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn missing_names(missing: &[MissingProject]) -> String {
    missing
        .iter()
        .map(|m| m.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ImportError {
    /// Wrap a location lookup failure with the import that triggered it.
    pub fn in_import(self, project: &str, import: &str) -> Self {
        ImportError::Unresolved {
            project: project.to_string(),
            import: import.to_string(),
            source: Box::new(self),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = match self {
            ImportError::ManifestParse { path, message } => {
                Diagnostic::error(format!("failed to parse manifest: {}", message))
                    .with_location(path)
            }
            ImportError::InvalidProject { dir, reason } => {
                Diagnostic::error(format!("not a valid project: {}", reason)).with_location(dir)
            }
            ImportError::NotInProject { dir } => {
                Diagnostic::error(self.to_string()).with_location(dir)
            }
            ImportError::Unresolved { source, .. } => {
                let diag = Diagnostic::error(self.to_string()).with_note(source.to_string());
                if matches!(**source, ImportError::UnknownRegistryName { .. }) {
                    diag.with_help(suggestions::UNKNOWN_NAME)
                } else {
                    diag
                }
            }
            ImportError::UnknownRegistryName { .. } => {
                Diagnostic::error(self.to_string()).with_help(suggestions::UNKNOWN_NAME)
            }
            ImportError::IncompleteGraph { missing } => missing
                .iter()
                .fold(Diagnostic::error(self.to_string()), |diag, m| {
                    diag.with_note(m.summary())
                })
                .with_help(suggestions::RUN_FETCH),
            ImportError::RegistryParse { path, message } => {
                Diagnostic::error(format!("failed to parse registry: {}", message))
                    .with_location(path)
            }
            ImportError::Io { path, source } => Diagnostic::error(self.to_string())
                .with_location(path)
                .with_note(source.to_string()),
            _ => Diagnostic::error(self.to_string()),
        };

        // The miette help says the same as RUN_FETCH for incomplete graphs.
        match MietteDiagnostic::help(self) {
            Some(help) if !matches!(self, ImportError::IncompleteGraph { .. }) => {
                diag.with_help(help.to_string())
            }
            _ => diag,
        }
    }
}
