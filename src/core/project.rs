//! Project identity: directory validation and name derivation.
//!
//! A project is a directory containing a `Quay.toml`. Its name is either
//! the directory name or the last segment of the source location it is
//! cloned from.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::resolver::errors::ImportError;

/// The manifest file name.
pub const MANIFEST_NAME: &str = "Quay.toml";

static PROJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$").unwrap());

/// Check whether `name` is usable as a project (and directory) name.
pub fn is_valid_project_name(name: &str) -> bool {
    PROJECT_NAME.is_match(name)
}

/// Check whether `dir` is a project directory.
pub fn is_valid_project_dir(dir: &Path) -> bool {
    dir.is_dir() && dir.join(MANIFEST_NAME).is_file()
}

/// Fail with [`ImportError::InvalidProject`] unless `dir` is a project.
pub fn ensure_valid_project_dir(dir: &Path) -> Result<(), ImportError> {
    if !dir.is_dir() {
        return Err(ImportError::InvalidProject {
            dir: dir.to_path_buf(),
            reason: "directory does not exist".to_string(),
        });
    }
    if !dir.join(MANIFEST_NAME).is_file() {
        return Err(ImportError::InvalidProject {
            dir: dir.to_path_buf(),
            reason: format!("no {} found", MANIFEST_NAME),
        });
    }
    Ok(())
}

/// Derive a project name from its directory.
pub fn project_name_from_dir(dir: &Path) -> Option<String> {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| is_valid_project_name(name))
}

/// Derive a project name from a source location.
///
/// `https://github.com/user/libA.git`, `git@host:user/libA` and
/// `file:///srv/git/libA/` all yield `libA`.
pub fn project_name_from_location(location: &str) -> Option<String> {
    let trimmed = location.trim().trim_end_matches('/');
    let segment = trimmed
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or(trimmed);
    let name = segment.strip_suffix(".git").unwrap_or(segment);

    if is_valid_project_name(name) {
        Some(name.to_string())
    } else {
        None
    }
}
