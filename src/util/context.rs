//! Global context for quay operations.
//!
//! Provides centralized access to configuration, paths, and environment.
//!
//! ## Registry location
//!
//! The registry used to resolve short project names is found in this
//! order, first hit wins:
//! 1. `--registry <path>` / `QUAY_REGISTRY`
//! 2. `imports.registry` in configuration
//! 3. `registry.toml` next to the quay executable
//! 4. The registry compiled into quay

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

use crate::core::project::MANIFEST_NAME;
use crate::core::Workspace;
use crate::resolver::errors::ImportError;
use crate::resolver::registry::Registry;
use crate::util::config::{load_config, project_config_path, Config};

/// File name of an installed registry.
pub const REGISTRY_FILE_NAME: &str = "registry.toml";

/// Everything a command needs to work on one project.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub workspace: Workspace,
    pub config: Config,
    pub registry: Registry,
}

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global quay data (~/.quay/)
    home: PathBuf,

    /// Whether to use verbose output
    verbose: bool,

    /// Whether to use colors in output
    color: bool,

    /// Registry file given on the command line
    registry_override: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let home = BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".quay"))
            .unwrap_or_else(|| PathBuf::from(".quay"));

        Ok(GlobalContext {
            cwd,
            home,
            verbose: false,
            color: true,
            registry_override: None,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Use a different home directory.
    pub fn with_home(mut self, home: PathBuf) -> Self {
        self.home = home;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Set color output.
    pub fn set_color(&mut self, color: bool) {
        self.color = color;
    }

    /// Use the given registry file regardless of configuration.
    pub fn set_registry(&mut self, path: Option<PathBuf>) {
        self.registry_override = path;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the quay home directory (~/.quay/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Find the project root: the nearest directory at or above cwd
    /// containing a Quay.toml.
    pub fn find_project_root(&self) -> Result<PathBuf, ImportError> {
        let mut current = self.cwd.clone();
        loop {
            if current.join(MANIFEST_NAME).is_file() {
                return Ok(current);
            }
            if !current.pop() {
                return Err(ImportError::NotInProject {
                    dir: self.cwd.clone(),
                });
            }
        }
    }

    /// Load configuration, merging the project config when a root is given.
    pub fn load_config(&self, project_root: Option<&Path>) -> Config {
        let project_path = project_root
            .map(project_config_path)
            .unwrap_or_default();
        load_config(&self.config_path(), &project_path)
    }

    /// Registry file to load, None for the built-in registry.
    pub fn registry_path(&self, config: &Config) -> Option<PathBuf> {
        if let Some(path) = &self.registry_override {
            return Some(path.clone());
        }
        if let Some(path) = &config.imports.registry {
            return Some(path.clone());
        }

        let installed = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(REGISTRY_FILE_NAME)))?;
        installed.is_file().then_some(installed)
    }

    /// Load the registry for this invocation.
    pub fn load_registry(&self, config: &Config) -> Result<Registry, ImportError> {
        match self.registry_path(config) {
            Some(path) => Registry::load(&path),
            None => {
                tracing::debug!("using built-in registry");
                Ok(Registry::builtin())
            }
        }
    }

    /// Open the project containing cwd with its configuration and registry.
    pub fn project(&self) -> Result<ProjectContext, ImportError> {
        let root = self.find_project_root()?;
        self.project_at(&root)
    }

    /// Open the project in `root`.
    pub fn project_at(&self, root: &Path) -> Result<ProjectContext, ImportError> {
        let config = self.load_config(Some(root));
        let workspace = Workspace::new(root, &config)?;
        let registry = self.load_registry(&config)?;

        Ok(ProjectContext {
            workspace,
            config,
            registry,
        })
    }
}
