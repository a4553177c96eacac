//! Export merge engine.
//!
//! Flattens the exports of every imported project into one configuration
//! for the build-file generator. Entries are allocated in graph order,
//! walking each project's own imports in manifest order. Collisions are
//! resolved first-wins and reported as [`MergeWarning`]s.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;

use crate::resolver::graph::{ImportGraph, ProjectNode, ResolvedImport};
use crate::util::diagnostic::Diagnostic;

/// The merged configuration of a complete import graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedConfig {
    /// One entry per imported project, in merge order
    pub imports: IndexMap<String, MergedImport>,

    /// Collisions and missing paths found while merging
    pub warnings: Vec<MergeWarning>,
}

/// Everything one imported project contributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedImport {
    /// Module source directory -> build subdirectory
    pub modules: IndexMap<PathBuf, String>,
    pub header_dirs: Vec<PathBuf>,
    /// Header directory -> condition
    pub conditional_header_dirs: IndexMap<PathBuf, String>,
    pub lib_dirs: Vec<PathBuf>,
    pub defines: IndexMap<String, String>,
    pub condition: Option<String>,
    pub group: Option<String>,
}

impl MergedImport {
    /// Check whether the project contributed nothing.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
            && self.header_dirs.is_empty()
            && self.conditional_header_dirs.is_empty()
            && self.lib_dirs.is_empty()
            && self.defines.is_empty()
    }
}

/// Kind of an exported directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirKind {
    Header,
    ConditionalHeader,
    Lib,
}

impl fmt::Display for DirKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirKind::Header => write!(f, "header dir"),
            DirKind::ConditionalHeader => write!(f, "conditional header dir"),
            DirKind::Lib => write!(f, "lib dir"),
        }
    }
}

/// A non-fatal problem found while merging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum MergeWarning {
    /// Two projects export the same define with different values.
    DefineCollision {
        define: String,
        kept: String,
        kept_from: String,
        ignored: String,
        ignored_from: String,
    },

    /// Two projects export the same module name from different directories.
    ModuleCollision {
        module: String,
        kept: PathBuf,
        kept_from: String,
        ignored: PathBuf,
        ignored_from: String,
    },

    /// A project is imported twice with different conditions.
    ConditionMismatch {
        import: String,
        kept: Option<String>,
        ignored: Option<String>,
        importer: String,
    },

    /// A project is imported twice with different groups.
    GroupMismatch {
        import: String,
        kept: Option<String>,
        ignored: Option<String>,
        importer: String,
    },

    /// An exported directory does not exist.
    MissingPath {
        project: String,
        kind: DirKind,
        path: PathBuf,
    },
}

fn display_opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("<none>")
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::DefineCollision {
                define,
                kept,
                kept_from,
                ignored,
                ignored_from,
            } => write!(
                f,
                "define collision: `{define}` is `{kept}` (from `{kept_from}`), ignoring `{ignored}` (from `{ignored_from}`)"
            ),
            MergeWarning::ModuleCollision {
                module,
                kept,
                kept_from,
                ignored,
                ignored_from,
            } => write!(
                f,
                "module collision: `{module}` is {} (from `{kept_from}`), ignoring {} (from `{ignored_from}`)",
                kept.display(),
                ignored.display()
            ),
            MergeWarning::ConditionMismatch {
                import,
                kept,
                ignored,
                importer,
            } => write!(
                f,
                "condition mismatch: `{import}` is imported with condition `{}`, ignoring `{}` from `{importer}`",
                display_opt(kept),
                display_opt(ignored)
            ),
            MergeWarning::GroupMismatch {
                import,
                kept,
                ignored,
                importer,
            } => write!(
                f,
                "group mismatch: `{import}` is imported into group `{}`, ignoring `{}` from `{importer}`",
                display_opt(kept),
                display_opt(ignored)
            ),
            MergeWarning::MissingPath {
                project,
                kind,
                path,
            } => write!(
                f,
                "{kind} {} exported by `{project}` does not exist",
                path.display()
            ),
        }
    }
}

impl MergeWarning {
    /// Warning diagnostic naming the kept and the ignored side.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            MergeWarning::DefineCollision {
                define,
                kept,
                kept_from,
                ignored,
                ignored_from,
            } => Diagnostic::warning(format!("define `{}` is exported twice", define))
                .with_note(format!("kept `{}` from `{}`", kept, kept_from))
                .with_note(format!("ignored `{}` from `{}`", ignored, ignored_from)),
            MergeWarning::ModuleCollision {
                module,
                kept,
                kept_from,
                ignored,
                ignored_from,
            } => Diagnostic::warning(format!("module `{}` is exported twice", module))
                .with_location(ignored)
                .with_note(format!("kept {} from `{}`", kept.display(), kept_from))
                .with_note(format!("ignored this directory from `{}`", ignored_from)),
            MergeWarning::ConditionMismatch {
                import,
                kept,
                ignored,
                importer,
            } => Diagnostic::warning(format!("`{}` is imported with different conditions", import))
                .with_note(format!("kept `{}`", display_opt(kept)))
                .with_note(format!("ignored `{}` from `{}`", display_opt(ignored), importer)),
            MergeWarning::GroupMismatch {
                import,
                kept,
                ignored,
                importer,
            } => Diagnostic::warning(format!("`{}` is imported into different groups", import))
                .with_note(format!("kept `{}`", display_opt(kept)))
                .with_note(format!("ignored `{}` from `{}`", display_opt(ignored), importer)),
            MergeWarning::MissingPath {
                project,
                kind,
                path,
            } => Diagnostic::warning(format!("{} exported by `{}` does not exist", kind, project))
                .with_location(path),
        }
    }
}

/// Build subdirectory for a module: `<project>_<module>`.
pub fn build_subdir(project: &str, module: &str) -> String {
    format!("{}_{}", project, module)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Running state shared by all entries.
#[derive(Default)]
struct Merger {
    config: MergedConfig,
    defines: HashMap<String, (String, String)>,
    modules: HashMap<String, (PathBuf, String)>,
    seen_dirs: HashSet<(DirKind, PathBuf)>,
    build_subdirs: HashSet<String>,
}

impl Merger {
    fn warn(&mut self, warning: MergeWarning) {
        tracing::debug!("{}", warning);
        self.config.warnings.push(warning);
    }

    /// Build subdirectory not handed out before.
    ///
    /// `a_b` + `c` and `a` + `b_c` both name `a_b_c`; later claimants get
    /// a numeric suffix in merge order.
    fn unique_build_subdir(&mut self, project: &str, module: &str) -> String {
        let base = build_subdir(project, module);
        let mut candidate = base.clone();
        let mut n = 2;
        while !self.build_subdirs.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        candidate
    }

    /// Handle one import of `importer`.
    fn add_import(&mut self, graph: &ImportGraph, importer: &ProjectNode, import: &ResolvedImport) {
        if import.name == graph.root_name() {
            return;
        }

        if let Some(existing) = self.config.imports.get(&import.name) {
            let (kept_cond, kept_group) = (existing.condition.clone(), existing.group.clone());
            if kept_cond != import.spec.condition {
                self.warn(MergeWarning::ConditionMismatch {
                    import: import.name.clone(),
                    kept: kept_cond,
                    ignored: import.spec.condition.clone(),
                    importer: importer.name.clone(),
                });
            }
            if kept_group != import.spec.group {
                self.warn(MergeWarning::GroupMismatch {
                    import: import.name.clone(),
                    kept: kept_group,
                    ignored: import.spec.group.clone(),
                    importer: importer.name.clone(),
                });
            }
            return;
        }

        let mut entry = MergedImport {
            condition: import.spec.condition.clone(),
            group: import.spec.group.clone(),
            ..Default::default()
        };

        match graph.get(&import.name) {
            Some(project) => self.contribute(project, &mut entry),
            None => tracing::debug!("`{}` is not in the graph, nothing to merge", import.name),
        }

        self.config.imports.insert(import.name.clone(), entry);
    }

    /// Add the exports of `project` to its entry.
    fn contribute(&mut self, project: &ProjectNode, entry: &mut MergedImport) {
        let exports = project.exports();
        let root = project.project_dir.as_path();

        for dir in &exports.header_dirs {
            if let Some(path) = self.existing_dir(project, DirKind::Header, root, dir) {
                entry.header_dirs.push(path);
            }
        }

        for cond_dir in &exports.conditional_header_dirs {
            if let Some(path) =
                self.existing_dir(project, DirKind::ConditionalHeader, root, &cond_dir.path)
            {
                entry
                    .conditional_header_dirs
                    .insert(path, cond_dir.condition.clone());
            }
        }

        for dir in &exports.lib_dirs {
            if let Some(path) = self.existing_dir(project, DirKind::Lib, root, dir) {
                entry.lib_dirs.push(path);
            }
        }

        for (key, value) in &exports.defines {
            match self.defines.get(key) {
                Some((kept, _)) if kept == value => {}
                Some((kept, kept_from)) => {
                    let warning = MergeWarning::DefineCollision {
                        define: key.clone(),
                        kept: kept.clone(),
                        kept_from: kept_from.clone(),
                        ignored: value.clone(),
                        ignored_from: project.name.clone(),
                    };
                    self.warn(warning);
                }
                None => {
                    self.defines
                        .insert(key.clone(), (value.clone(), project.name.clone()));
                    entry.defines.insert(key.clone(), value.clone());
                }
            }
        }

        for (module, dir) in &exports.modules {
            let source_dir = root.join(dir);
            match self.modules.get(module) {
                Some((kept, _)) if *kept == source_dir => {}
                Some((kept, kept_from)) => {
                    let warning = MergeWarning::ModuleCollision {
                        module: module.clone(),
                        kept: kept.clone(),
                        kept_from: kept_from.clone(),
                        ignored: source_dir,
                        ignored_from: project.name.clone(),
                    };
                    self.warn(warning);
                }
                None => {
                    self.modules
                        .insert(module.clone(), (source_dir.clone(), project.name.clone()));
                    let subdir = self.unique_build_subdir(&project.name, module);
                    entry.modules.insert(source_dir, subdir);
                }
            }
        }
    }

    /// Resolve an exported directory, skipping missing and already-seen ones.
    fn existing_dir(
        &mut self,
        project: &ProjectNode,
        kind: DirKind,
        root: &Path,
        dir: &str,
    ) -> Option<PathBuf> {
        let path = root.join(dir);
        if !path.exists() {
            self.warn(MergeWarning::MissingPath {
                project: project.name.clone(),
                kind,
                path,
            });
            return None;
        }
        if !self.seen_dirs.insert((kind, path.clone())) {
            return None;
        }
        Some(path)
    }
}

/// Merge the exports of every imported project.
///
/// Returns None when the graph is incomplete; nothing is merged from a
/// partial graph.
pub fn merge(graph: &ImportGraph) -> Option<MergedConfig> {
    if !graph.is_complete() {
        return None;
    }

    let mut merger = Merger::default();
    for project in graph.projects() {
        for import in &project.imports {
            merger.add_import(graph, project, import);
        }
    }

    tracing::debug!(
        "merged {} import(s) with {} warning(s)",
        merger.config.imports.len(),
        merger.config.warnings.len()
    );

    Some(merger.config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::registry::Registry;
    use crate::resolver::walk::walk;
    use crate::test_support::{manifests, ProjectFixture, TestWorkspace};

    fn merged(tws: &TestWorkspace, root: &str) -> MergedConfig {
        let graph = walk(&tws.workspace(root), &Registry::new()).unwrap();
        merge(&graph).unwrap()
    }

    #[test]
    fn test_single_library_end_to_end() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("root").with_manifest(manifests::imports(&["libA"])));
        tws.add(
            ProjectFixture::new("libA")
                .with_manifest(
                    r#"
[exports]
header_dirs = ["include"]

[exports.modules]
core = "src/core"
"#,
                )
                .with_dir("include")
                .with_dir("src/core"),
        );

        let config = merged(&tws, "root");
        let lib_a_dir = tws.project_dir("libA");

        assert_eq!(config.imports.len(), 1);
        let entry = &config.imports["libA"];
        assert_eq!(entry.header_dirs, vec![lib_a_dir.join("include")]);
        assert_eq!(entry.modules.len(), 1);
        assert_eq!(entry.modules[&lib_a_dir.join("src/core")], "libA_core");
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_define_collision_first_wins() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("A").with_manifest(manifests::imports(&["B", "C"])));
        tws.add(ProjectFixture::new("B").with_manifest(manifests::defines(&[("X", "1")])));
        tws.add(ProjectFixture::new("C").with_manifest(manifests::defines(&[("X", "2")])));

        let config = merged(&tws, "A");

        assert_eq!(config.imports["B"].defines["X"], "1");
        assert!(config.imports["C"].defines.is_empty());
        assert_eq!(config.warnings.len(), 1);
        let message = config.warnings[0].to_string();
        assert!(message.contains("`1`"), "{message}");
        assert!(message.contains("`2`"), "{message}");
    }

    #[test]
    fn test_collision_diagnostics() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("A").with_manifest(manifests::imports(&["B", "C"])));
        tws.add(ProjectFixture::new("B").with_manifest(
            "[exports.defines]\nX = 1\n\n[exports.modules]\nutil = \"src\"\n",
        ));
        tws.add(ProjectFixture::new("C").with_manifest(
            "[exports.defines]\nX = 2\n\n[exports.modules]\nutil = \"lib\"\n",
        ));

        let config = merged(&tws, "A");
        let output: Vec<String> = config
            .warnings
            .iter()
            .map(|w| w.to_diagnostic().format(false))
            .collect();

        assert_eq!(
            output[0],
            "warning: define `X` is exported twice\n  note: kept `1` from `B`\n  note: ignored `2` from `C`\n"
        );
        assert!(output[1].starts_with("warning: module `util` is exported twice\n"));
        assert!(output[1].contains(&format!("--> {}", tws.project_dir("C").join("lib").display())));
        assert!(output[1].contains("note: ignored this directory from `C`"));
    }

    #[test]
    fn test_same_define_value_is_not_a_collision() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("A").with_manifest(manifests::imports(&["B", "C"])));
        tws.add(ProjectFixture::new("B").with_manifest(manifests::defines(&[("X", "1")])));
        tws.add(ProjectFixture::new("C").with_manifest(manifests::defines(&[("X", "1")])));

        let config = merged(&tws, "A");
        assert!(config.warnings.is_empty());
        assert_eq!(config.imports["B"].defines["X"], "1");
    }

    #[test]
    fn test_diamond_dirs_appear_once() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("A").with_manifest(manifests::imports(&["B", "C"])));
        tws.add(ProjectFixture::new("B").with_manifest(manifests::imports(&["D"])));
        tws.add(ProjectFixture::new("C").with_manifest(manifests::imports(&["D"])));
        tws.add(ProjectFixture::library("D"));

        let config = merged(&tws, "A");

        let keys: Vec<_> = config.imports.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["D", "B", "C"]);

        let all_headers: Vec<&PathBuf> = config
            .imports
            .values()
            .flat_map(|e| e.header_dirs.iter())
            .collect();
        assert_eq!(all_headers, vec![&tws.project_dir("D").join("include")]);
        assert!(config.imports["B"].is_empty());
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_missing_dirs_warn_and_skip() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("app").with_manifest(manifests::imports(&["libA"])));
        tws.add(
            ProjectFixture::new("libA")
                .with_manifest(
                    r#"
[exports]
header_dirs = ["include", "generated"]
lib_dirs = ["lib"]
conditional_header_dirs = [{ path = "include/posix", cond = "UNIX" }]
"#,
                )
                .with_dir("include/posix"),
        );

        let config = merged(&tws, "app");
        let entry = &config.imports["libA"];
        let lib_a_dir = tws.project_dir("libA");

        assert_eq!(entry.header_dirs, vec![lib_a_dir.join("include")]);
        assert!(entry.lib_dirs.is_empty());
        assert_eq!(
            entry.conditional_header_dirs[&lib_a_dir.join("include/posix")],
            "UNIX"
        );

        let missing: Vec<_> = config
            .warnings
            .iter()
            .filter_map(|w| match w {
                MergeWarning::MissingPath { kind, path, .. } => Some((*kind, path.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            missing,
            vec![
                (DirKind::Header, lib_a_dir.join("generated")),
                (DirKind::Lib, lib_a_dir.join("lib")),
            ]
        );

        let diag = config.warnings[0].to_diagnostic();
        assert_eq!(diag.message, "header dir exported by `libA` does not exist");
        assert_eq!(diag.location, Some(lib_a_dir.join("generated")));
    }

    #[test]
    fn test_module_collision_keeps_first() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("A").with_manifest(manifests::imports(&["B", "C"])));
        tws.add(ProjectFixture::new("B").with_manifest("[exports.modules]\nutil = \"src\"\n"));
        tws.add(ProjectFixture::new("C").with_manifest("[exports.modules]\nutil = \"src\"\n"));

        let config = merged(&tws, "A");

        let b_src = tws.project_dir("B").join("src");
        assert_eq!(config.imports["B"].modules[&b_src], "B_util");
        assert!(config.imports["C"].modules.is_empty());
        assert!(matches!(
            &config.warnings[..],
            [MergeWarning::ModuleCollision { module, ignored_from, .. }]
                if module == "util" && ignored_from == "C"
        ));
    }

    #[test]
    fn test_condition_first_occurrence_wins() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("A").with_manifest(manifests::imports(&["B", "C"])));
        tws.add(ProjectFixture::new("B").with_manifest(
            "[imports.D]\ngit = \"https://example.com/D.git\"\ncond = \"WIN32\"\ngroup = \"Libs\"\n",
        ));
        tws.add(ProjectFixture::new("C").with_manifest(
            "[imports.D]\ngit = \"https://example.com/D.git\"\ncond = \"UNIX\"\ngroup = \"Libs\"\n",
        ));
        tws.add(ProjectFixture::library("D"));

        let config = merged(&tws, "A");

        let d = &config.imports["D"];
        assert_eq!(d.condition.as_deref(), Some("WIN32"));
        assert_eq!(d.group.as_deref(), Some("Libs"));
        assert_eq!(config.warnings.len(), 1);
        assert!(matches!(
            &config.warnings[0],
            MergeWarning::ConditionMismatch { importer, .. } if importer == "C"
        ));
    }

    #[test]
    fn test_root_never_gets_an_entry() {
        let tws = TestWorkspace::new();
        let manifest = format!(
            "{}\n[exports]\nheader_dirs = [\"include\"]\n",
            manifests::imports(&["B"])
        );
        tws.add(ProjectFixture::library("A").with_manifest(manifest));
        tws.add(ProjectFixture::new("B").with_manifest(manifests::imports(&["A"])));

        let config = merged(&tws, "A");
        let keys: Vec<_> = config.imports.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["B"]);
    }

    #[test]
    fn test_incomplete_graph_merges_nothing() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("app").with_manifest(manifests::imports(&["libA"])));

        let graph = walk(&tws.workspace("app"), &Registry::new()).unwrap();
        assert!(!graph.is_complete());
        assert!(merge(&graph).is_none());
    }

    #[test]
    fn test_merge_is_deterministic() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("A").with_manifest(manifests::imports(&["B", "C"])));
        tws.add(ProjectFixture::library("B").with_manifest(manifests::imports(&["D"])));
        tws.add(ProjectFixture::library("C"));
        tws.add(ProjectFixture::library("D"));

        let first = merged(&tws, "A");
        let second = merged(&tws, "A");
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_build_subdirs_never_shared() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("app").with_manifest(manifests::imports(&["a_b", "a"])));
        tws.add(ProjectFixture::new("a_b").with_manifest("[exports.modules]\nc = \"src\"\n"));
        tws.add(ProjectFixture::new("a").with_manifest("[exports.modules]\nb_c = \"src\"\n"));

        let config = merged(&tws, "app");
        assert!(config.warnings.is_empty());
        assert_eq!(
            config.imports["a_b"].modules[&tws.project_dir("a_b").join("src")],
            "a_b_c"
        );
        assert_eq!(
            config.imports["a"].modules[&tws.project_dir("a").join("src")],
            "a_b_c_2"
        );
    }

    #[test]
    fn test_build_subdir_sanitized() {
        assert_eq!(build_subdir("libA", "core"), "libA_core");
        assert_eq!(build_subdir("fips-glm", "glm"), "fips-glm_glm");
        assert_eq!(build_subdir("libA", "ext/zip"), "libA_ext_zip");
    }
}
