//! Test utilities for quay unit tests.
//!
//! This module provides an on-disk workspace builder and helpers for
//! creating local git repositories, so resolution and fetch can be tested
//! against real directories without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use quay::test_support::{manifests, ProjectFixture, TestWorkspace};
//!
//! #[test]
//! fn test_example() {
//!     let tws = TestWorkspace::new();
//!     tws.add(ProjectFixture::new("app").with_manifest(manifests::imports(&["libA"])));
//!     tws.add(ProjectFixture::library("libA"));
//!
//!     let ws = tws.workspace("app");
//!     // Walk, merge, generate...
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::Workspace;
use crate::util::Config;

// Re-export fixtures for convenience
pub use fixtures::*;

/// A temporary workspace directory holding sibling projects.
pub struct TestWorkspace {
    _tmp: TempDir,
    dir: PathBuf,
}

impl TestWorkspace {
    /// Create an empty workspace.
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let dir = tmp.path().join("ws");
        std::fs::create_dir_all(&dir).expect("failed to create workspace dir");
        let dir = dir.canonicalize().expect("failed to canonicalize workspace dir");
        TestWorkspace { _tmp: tmp, dir }
    }

    /// Workspace directory.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Conventional directory of a project.
    pub fn project_dir(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write a project into the workspace.
    pub fn add(&self, fixture: ProjectFixture) -> PathBuf {
        fixture
            .write_to(&self.dir)
            .expect("failed to write project fixture")
    }

    /// Workspace rooted at the named project, with default configuration.
    pub fn workspace(&self, root: &str) -> Workspace {
        self.workspace_with(root, &Config::default())
    }

    /// Workspace rooted at the named project.
    pub fn workspace_with(&self, root: &str, config: &Config) -> Workspace {
        Workspace::new(&self.project_dir(root), config).expect("failed to open workspace")
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// `file://` URL for a local path.
pub fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

/// Turn a fixture directory into a git repository with one commit.
///
/// Returns the name of the checked-out branch.
pub fn init_git_repo(dir: &Path) -> String {
    let repo = git2::Repository::init(dir).expect("failed to init repository");
    commit_all(&repo, "initial commit");

    let head = repo.head().expect("repository has no HEAD");
    head.shorthand().unwrap_or("master").to_string()
}

/// Stage everything in the work tree and commit it.
pub fn commit_all(repo: &git2::Repository, message: &str) -> git2::Oid {
    let mut index = repo.index().expect("failed to open index");
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .expect("failed to stage files");
    index.write().expect("failed to write index");
    let tree_id = index.write_tree().expect("failed to write tree");
    let tree = repo.find_tree(tree_id).expect("failed to find tree");

    let sig = git2::Signature::now("quay-test", "quay-test@example.com")
        .expect("failed to create signature");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("failed to commit")
}

/// Assertion helpers for tests.
pub mod assertions {
    /// Assert that a result is an error whose message contains `expected`.
    pub fn assert_error_contains<T: std::fmt::Debug, E: std::fmt::Display>(
        result: Result<T, E>,
        expected: &str,
    ) {
        match result {
            Ok(value) => panic!("expected error containing {:?}, got Ok({:?})", expected, value),
            Err(e) => {
                let message = e.to_string();
                assert!(
                    message.contains(expected),
                    "error {:?} does not contain {:?}",
                    message,
                    expected
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_layout() {
        let tws = TestWorkspace::new();
        let dir = tws.add(ProjectFixture::library("libA").with_dir("lib"));

        assert_eq!(dir, tws.project_dir("libA"));
        assert!(dir.join("Quay.toml").is_file());
        assert!(dir.join("include/libA.h").is_file());
        assert!(dir.join("src/CMakeLists.txt").is_file());
        assert!(dir.join("lib").is_dir());
    }

    #[test]
    fn test_init_git_repo() {
        let tws = TestWorkspace::new();
        let dir = tws.add(ProjectFixture::library("libA"));

        let branch = init_git_repo(&dir);
        let repo = git2::Repository::open(&dir).unwrap();
        assert_eq!(repo.head().unwrap().shorthand(), Some(branch.as_str()));
        assert!(file_url(&dir).starts_with("file://"));
    }
}
