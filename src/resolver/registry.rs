//! Project registry: short project names to git source locations.
//!
//! ## Example registry.toml
//!
//! ```toml
//! fips-glm = "https://github.com/floooh/fips-glm.git"
//! zlib = "https://github.com/madler/zlib.git"
//! ```
//!
//! The registry is loaded once by the caller and passed by reference to
//! everything that needs to resolve import locations.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use url::Url;

use crate::resolver::errors::ImportError;

/// The registry compiled into the binary.
pub const BUILTIN_REGISTRY: &str = include_str!("../../registry.toml");

/// URL schemes accepted as source locations.
const SOURCE_SCHEMES: &[&str] = &["http", "https", "ssh", "git", "file"];

/// A loaded project registry.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: IndexMap<String, String>,
    path: Option<PathBuf>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from name/location pairs.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Registry {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            path: None,
        }
    }

    /// The registry shipped with quay.
    pub fn builtin() -> Self {
        // The embedded file is checked by the test suite.
        Self::parse(BUILTIN_REGISTRY, Path::new("<builtin registry.toml>")).unwrap_or_default()
    }

    /// Load a registry file.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut registry = Self::parse(&content, path)?;
        registry.path = Some(path.to_path_buf());
        tracing::debug!(
            "loaded {} registry entries from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parse registry content.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ImportError> {
        let entries: IndexMap<String, String> =
            toml::from_str(content).map_err(|e| ImportError::RegistryParse {
                path: path.to_path_buf(),
                message: e.to_string().trim().to_string(),
            })?;

        Ok(Registry {
            entries,
            path: None,
        })
    }

    /// Resolve a registry name or source location to a source location.
    ///
    /// Source locations are returned unchanged; anything else must be a
    /// registry name.
    pub fn resolve_location(&self, name_or_url: &str) -> Result<String, ImportError> {
        if is_source_location(name_or_url) {
            return Ok(name_or_url.to_string());
        }

        match self.entries.get(name_or_url) {
            Some(url) => {
                tracing::debug!("registry lookup: {} => {}", name_or_url, url);
                Ok(url.clone())
            }
            None => Err(ImportError::UnknownRegistryName {
                name: name_or_url.to_string(),
            }),
        }
    }

    /// Look up a name without the source-location passthrough.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Check if a name is in the registry.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate over entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File the registry was loaded from (None for built-in or in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Check whether a string already is a fetchable source location.
pub fn is_source_location(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() {
        return false;
    }
    if s.ends_with(".git") {
        return true;
    }
    if let Ok(url) = Url::parse(s) {
        return SOURCE_SCHEMES.contains(&url.scheme()) && !url.path().trim_matches('/').is_empty();
    }
    is_scp_like(s)
}

/// `user@host:path`, as understood by git.
fn is_scp_like(s: &str) -> bool {
    match (s.find('@'), s.find(':')) {
        (Some(at), Some(colon)) => at > 0 && colon > at + 1 && colon + 1 < s.len(),
        _ => false,
    }
}
