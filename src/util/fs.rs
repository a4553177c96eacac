//! Filesystem utilities.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Result of an atomic write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created or replaced.
    Written,
    /// The file already had the same content and was left alone.
    Unchanged,
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write `contents` to `path` unless it already holds exactly that.
///
/// The new content goes to a temporary file in the same directory which
/// is then renamed over the target, so readers never see a partial file.
pub fn write_if_changed(path: &Path, contents: &str) -> Result<WriteOutcome> {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing == contents {
            return Ok(WriteOutcome::Unchanged);
        }
    }

    let dir = path.parent().unwrap_or(Path::new("."));
    ensure_dir(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write {}", tmp.path().display()))?;
    tmp.persist(path)
        .with_context(|| format!("failed to write file: {}", path.display()))?;

    Ok(WriteOutcome::Written)
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a path with forward slashes, as CMake expects.
pub fn to_forward_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_if_changed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("file.txt");

        assert_eq!(write_if_changed(&path, "one").unwrap(), WriteOutcome::Written);
        assert_eq!(write_if_changed(&path, "one").unwrap(), WriteOutcome::Unchanged);
        assert_eq!(write_if_changed(&path, "two").unwrap(), WriteOutcome::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "two");

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/ws/app"), Path::new("/ws/libA/include")),
            PathBuf::from("../libA/include")
        );
    }

    #[test]
    fn test_forward_slashes() {
        assert_eq!(to_forward_slashes(Path::new("a\\b/c")), "a/b/c");
    }

    #[test]
    fn test_remove_dir_all_if_exists() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("gone");
        remove_dir_all_if_exists(&dir).unwrap();
        fs::create_dir_all(dir.join("sub")).unwrap();
        remove_dir_all_if_exists(&dir).unwrap();
        assert!(!dir.exists());
    }
}
