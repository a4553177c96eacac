//! Workspace - the root project and the directory its imports live in.
//!
//! Imported projects are cloned as siblings of the root project, so the
//! conventional location of a project named `N` is `<workspace>/N`.

use std::path::{Path, PathBuf};

use crate::core::project::{ensure_valid_project_dir, project_name_from_dir, MANIFEST_NAME};
use crate::resolver::errors::ImportError;
use crate::util::Config;

/// Name of the generated CMake file written into the root project.
pub const IMPORTS_FILE_NAME: &str = ".quay-imports.cmake";

/// A workspace rooted at one project.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root project directory
    root: PathBuf,

    /// Root project name
    name: String,

    /// Directory holding the root project and its siblings
    workspace_dir: PathBuf,

    /// Branch for imports that do not name one
    default_branch: String,
}

impl Workspace {
    /// Create a workspace for the project in `root`.
    pub fn new(root: &Path, config: &Config) -> Result<Self, ImportError> {
        ensure_valid_project_dir(root)?;

        let root = root.canonicalize().map_err(|source| ImportError::Io {
            path: root.to_path_buf(),
            source,
        })?;

        let name = project_name_from_dir(&root).ok_or_else(|| ImportError::InvalidProject {
            dir: root.clone(),
            reason: "directory name is not a valid project name".to_string(),
        })?;

        let workspace_dir = match &config.imports.workspace_dir {
            Some(dir) => dir.clone(),
            None => root.parent().unwrap_or(Path::new("/")).to_path_buf(),
        };

        Ok(Workspace {
            root,
            name,
            workspace_dir,
            default_branch: config.default_branch().to_string(),
        })
    }

    /// Override the workspace directory.
    pub fn with_workspace_dir(mut self, dir: PathBuf) -> Self {
        self.workspace_dir = dir;
        self
    }

    /// Root project directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Root project name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding all projects.
    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    /// Branch for imports that do not name one.
    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// Conventional directory of the project named `name`.
    pub fn project_dir(&self, name: &str) -> PathBuf {
        if name == self.name {
            self.root.clone()
        } else {
            self.workspace_dir.join(name)
        }
    }

    /// Root manifest path.
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_NAME)
    }

    /// Path of the generated imports file.
    pub fn imports_file_path(&self) -> PathBuf {
        self.root.join(IMPORTS_FILE_NAME)
    }
}
