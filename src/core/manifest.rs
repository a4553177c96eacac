//! Quay.toml manifest parsing and schema.
//!
//! The manifest declares what a project imports from sibling projects and
//! what it exports to its importers. Defaults are applied once, here, so
//! the rest of the crate works with a single canonical shape.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::project::{ensure_valid_project_dir, project_name_from_dir, MANIFEST_NAME};
use crate::resolver::errors::ImportError;

/// Newest manifest schema this version understands.
pub const SCHEMA_VERSION: u32 = 1;

/// Branch used for imports that do not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// The parsed, normalized Quay.toml manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// Name of the project owning this manifest
    pub project: String,

    /// Imported projects keyed by import name, in document order
    pub imports: IndexMap<String, ImportSpec>,

    /// What this project offers to its importers
    pub exports: Exports,

    /// Path of the manifest file
    #[serde(skip)]
    pub path: PathBuf,
}

/// One entry of the `[imports]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSpec {
    /// Source URL or registry name
    pub location: String,

    /// Branch to clone
    pub branch: String,

    /// Pinned revision
    pub rev: Option<String>,

    /// Clone depth
    pub depth: Option<u32>,

    /// Opaque condition handed to the build-file generator
    pub condition: Option<String>,

    /// IDE group for the imported targets
    pub group: Option<String>,
}

/// The `[exports]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Exports {
    pub header_dirs: Vec<String>,
    pub conditional_header_dirs: Vec<ConditionalDir>,
    pub lib_dirs: Vec<String>,
    /// Preprocessor defines, values normalized to strings
    pub defines: IndexMap<String, String>,
    /// Build modules: module name -> directory relative to the project root
    pub modules: IndexMap<String, String>,
    pub policies: IndexMap<String, bool>,
}

impl Exports {
    /// Check whether nothing at all is exported.
    pub fn is_empty(&self) -> bool {
        self.header_dirs.is_empty()
            && self.conditional_header_dirs.is_empty()
            && self.lib_dirs.is_empty()
            && self.defines.is_empty()
            && self.modules.is_empty()
    }
}

/// A header directory only used when `condition` holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalDir {
    pub path: String,
    #[serde(alias = "cond")]
    pub condition: String,
}

/// Raw manifest as deserialized from TOML.
#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    schema: Option<u32>,

    #[serde(default)]
    imports: IndexMap<String, RawImport>,

    #[serde(default)]
    exports: RawExports,
}

/// Raw import: either a bare location string or a table.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawImport {
    Location(String),
    Detailed(RawImportTable),
}

#[derive(Debug, Default, Deserialize)]
struct RawImportTable {
    #[serde(default)]
    git: Option<String>,

    #[serde(default)]
    branch: Option<String>,

    #[serde(default)]
    rev: Option<String>,

    #[serde(default)]
    depth: Option<u32>,

    #[serde(default, alias = "condition")]
    cond: Option<String>,

    #[serde(default)]
    group: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawExports {
    #[serde(default, alias = "header-dirs")]
    header_dirs: Vec<String>,

    #[serde(default, alias = "conditional-header-dirs")]
    conditional_header_dirs: Vec<ConditionalDir>,

    #[serde(default, alias = "lib-dirs")]
    lib_dirs: Vec<String>,

    #[serde(default)]
    defines: IndexMap<String, toml::Value>,

    #[serde(default)]
    modules: IndexMap<String, String>,

    #[serde(default)]
    policies: IndexMap<String, bool>,
}

impl Manifest {
    /// Load the manifest of the project in `project_dir`.
    pub fn load(project_dir: &Path, default_branch: &str) -> Result<Self, ImportError> {
        ensure_valid_project_dir(project_dir)?;

        let path = project_dir.join(MANIFEST_NAME);
        let content = std::fs::read_to_string(&path).map_err(|source| ImportError::Io {
            path: path.clone(),
            source,
        })?;

        Self::parse(&content, &path, default_branch)
    }

    /// Parse manifest content; `path` is the manifest file location.
    pub fn parse(content: &str, path: &Path, default_branch: &str) -> Result<Self, ImportError> {
        let parse_error = |message: String| ImportError::ManifestParse {
            path: path.to_path_buf(),
            message,
        };

        let raw: RawManifest =
            toml::from_str(content).map_err(|e| parse_error(e.to_string().trim().to_string()))?;

        let schema = raw.schema.unwrap_or(SCHEMA_VERSION);
        if schema == 0 || schema > SCHEMA_VERSION {
            return Err(parse_error(format!(
                "unsupported manifest schema {}, expected {}",
                schema, SCHEMA_VERSION
            )));
        }

        let project = path
            .parent()
            .and_then(project_name_from_dir)
            .ok_or_else(|| {
                parse_error("cannot derive a project name from the manifest directory".to_string())
            })?;

        let mut imports = IndexMap::with_capacity(raw.imports.len());
        for (name, raw_import) in raw.imports {
            let spec = Self::convert_import(&project, &name, raw_import, default_branch)?;
            imports.insert(name, spec);
        }

        let exports = Self::convert_exports(raw.exports).map_err(parse_error)?;

        tracing::debug!(
            "loaded manifest of `{}`: {} import(s), {} module(s)",
            project,
            imports.len(),
            exports.modules.len()
        );

        Ok(Manifest {
            project,
            imports,
            exports,
            path: path.to_path_buf(),
        })
    }

    fn convert_import(
        project: &str,
        name: &str,
        raw: RawImport,
        default_branch: &str,
    ) -> Result<ImportSpec, ImportError> {
        let table = match raw {
            RawImport::Location(location) => RawImportTable {
                git: Some(location),
                ..Default::default()
            },
            RawImport::Detailed(table) => table,
        };

        let location = table
            .git
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .ok_or_else(|| ImportError::MissingSourceLocation {
                project: project.to_string(),
                import: name.to_string(),
            })?;

        Ok(ImportSpec {
            location,
            branch: table
                .branch
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| default_branch.to_string()),
            rev: table.rev.filter(|r| !r.is_empty()),
            depth: table.depth,
            condition: table.cond.filter(|c| !c.is_empty()),
            group: table.group.filter(|g| !g.is_empty()),
        })
    }

    fn convert_exports(raw: RawExports) -> Result<Exports, String> {
        let mut defines = IndexMap::with_capacity(raw.defines.len());
        for (key, value) in raw.defines {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => (if b { "1" } else { "0" }).to_string(),
                other => {
                    return Err(format!(
                        "define `{}` must be a string, integer, float or boolean, found {}",
                        key,
                        other.type_str()
                    ))
                }
            };
            defines.insert(key, value);
        }

        Ok(Exports {
            header_dirs: raw.header_dirs,
            conditional_header_dirs: raw.conditional_header_dirs,
            lib_dirs: raw.lib_dirs,
            defines,
            modules: raw.modules,
            policies: raw.policies,
        })
    }

    /// Directory containing the manifest.
    pub fn project_dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }
}

/// Generate a template Quay.toml for `quay init`.
pub fn generate_default_manifest(name: &str) -> String {
    format!(
        r#"# {name}: imports and exports for quay
schema = {SCHEMA_VERSION}

# [imports.fips-glm]
# git = "fips-glm"          # registry name or git URL
# branch = "{DEFAULT_BRANCH}"

[exports]
header_dirs = ["include"]
lib_dirs = []

[exports.modules]
# {name} = "src"

[exports.defines]
"#
    )
}
