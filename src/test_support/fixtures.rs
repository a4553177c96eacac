//! Test fixtures for common test scenarios.
//!
//! This module provides project fixtures and manifest templates for
//! building on-disk workspaces in tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::project::MANIFEST_NAME;

/// Fixture for a project directory.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    /// Project name, also the directory name.
    pub name: String,
    /// Quay.toml content.
    pub manifest: String,
    /// Directories to create (relative to the project root).
    pub dirs: Vec<PathBuf>,
    /// Files to create (relative to the project root -> content).
    pub files: HashMap<PathBuf, String>,
}

impl ProjectFixture {
    /// Create a project fixture with an empty manifest.
    pub fn new(name: impl Into<String>) -> Self {
        ProjectFixture {
            name: name.into(),
            manifest: String::new(),
            dirs: Vec::new(),
            files: HashMap::new(),
        }
    }

    /// Create a library exporting `include` and a module named after it.
    pub fn library(name: impl Into<String>) -> Self {
        let name = name.into();
        let guard = name.to_uppercase().replace(['-', '.'], "_");

        ProjectFixture::new(name.clone())
            .with_manifest(manifests::library(&name))
            .with_file(
                format!("include/{}.h", name),
                format!("#ifndef {guard}_H\n#define {guard}_H\n\nint {guard}_init(void);\n\n#endif\n"),
            )
            .with_file(
                "src/CMakeLists.txt",
                format!("add_library({name} STATIC lib.c)\n"),
            )
    }

    /// Set the manifest content.
    pub fn with_manifest(mut self, manifest: impl Into<String>) -> Self {
        self.manifest = manifest.into();
        self
    }

    /// Add a directory.
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.push(path.into());
        self
    }

    /// Add a file.
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    /// Write this fixture below `base_path`.
    pub fn write_to(&self, base_path: &Path) -> std::io::Result<PathBuf> {
        let project_path = base_path.join(&self.name);
        std::fs::create_dir_all(&project_path)?;

        std::fs::write(project_path.join(MANIFEST_NAME), &self.manifest)?;

        for dir in &self.dirs {
            std::fs::create_dir_all(project_path.join(dir))?;
        }

        for (rel_path, content) in &self.files {
            let full_path = project_path.join(rel_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&full_path, content)?;
        }

        Ok(project_path)
    }
}

/// Common manifest templates.
pub mod manifests {
    /// Source location used for test imports of `name`.
    pub fn location(name: &str) -> String {
        format!("https://example.com/{name}.git")
    }

    /// A manifest importing each named project by URL.
    pub fn imports(names: &[&str]) -> String {
        let mut manifest = String::from("[imports]\n");
        for name in names {
            manifest.push_str(&format!("{} = \"{}\"\n", name, location(name)));
        }
        manifest
    }

    /// A manifest exporting the given defines.
    pub fn defines(defines: &[(&str, &str)]) -> String {
        let mut manifest = String::from("[exports.defines]\n");
        for (key, value) in defines {
            manifest.push_str(&format!("{} = \"{}\"\n", key, value));
        }
        manifest
    }

    /// A library manifest exporting `include` and a module built from `src`.
    pub fn library(name: &str) -> String {
        format!(
            r#"[exports]
header_dirs = ["include"]

[exports.modules]
{name} = "src"
"#
        )
    }
}
