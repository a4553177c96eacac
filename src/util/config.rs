//! Configuration file support for quay.
//!
//! Two configuration file locations are read:
//! - Global: `~/.quay/config.toml` - User-wide defaults
//! - Project: `.quay/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.
//!
//! ```toml
//! [imports]
//! default_branch = "main"
//! registry = "/opt/quay/registry.toml"
//! workspace_dir = "/home/me/src"
//!
//! [fetch]
//! depth = 1
//! offline = false
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::manifest::DEFAULT_BRANCH;

/// Clone depth used when neither the import nor the config sets one.
pub const DEFAULT_CLONE_DEPTH: u32 = 10;

/// quay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Import resolution settings
    pub imports: ImportsConfig,

    /// Fetch settings
    pub fetch: FetchConfig,
}

/// Import resolution configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportsConfig {
    /// Branch for imports that do not name one
    pub default_branch: Option<String>,

    /// Registry file to use instead of the installed one
    pub registry: Option<PathBuf>,

    /// Directory holding the root project and its imported siblings
    pub workspace_dir: Option<PathBuf>,
}

/// Fetch configuration.
///
/// Unset fields fall through to the next config file, then to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Default clone depth (0 = full clone)
    pub depth: Option<u32>,

    /// Refuse to clone anything
    pub offline: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.imports.default_branch.is_some() {
            self.imports.default_branch = other.imports.default_branch;
        }
        if other.imports.registry.is_some() {
            self.imports.registry = other.imports.registry;
        }
        if other.imports.workspace_dir.is_some() {
            self.imports.workspace_dir = other.imports.workspace_dir;
        }

        if other.fetch.depth.is_some() {
            self.fetch.depth = other.fetch.depth;
        }
        if other.fetch.offline.is_some() {
            self.fetch.offline = other.fetch.offline;
        }
    }

    /// Branch for imports that do not name one.
    pub fn default_branch(&self) -> &str {
        self.imports
            .default_branch
            .as_deref()
            .unwrap_or(DEFAULT_BRANCH)
    }

    /// Default clone depth, None for a full clone.
    pub fn clone_depth(&self) -> Option<u32> {
        match self.fetch.depth.unwrap_or(DEFAULT_CLONE_DEPTH) {
            0 => None,
            depth => Some(depth),
        }
    }

    /// Whether cloning is disabled.
    pub fn offline(&self) -> bool {
        self.fetch.offline.unwrap_or(false)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.quay/config.toml)
/// 2. Global config (~/.quay/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the project config path (.quay/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".quay").join("config.toml")
}
