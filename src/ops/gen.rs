//! Generate the CMake imports file of the root project.
//!
//! Pipeline: walk the import graph, merge exports, render the merged
//! configuration as CMake and write it atomically into the root project.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::Workspace;
use crate::resolver::{merge, walk, ImportError, MergeWarning, MergedConfig, Registry};
use crate::util::fs::{to_forward_slashes, write_if_changed, WriteOutcome};

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "# machine generated by quay, do not edit, do not commit";

/// Outcome of `quay gen`.
#[derive(Debug)]
pub struct GenResult {
    /// File that was generated
    pub path: PathBuf,

    /// Whether the file changed
    pub outcome: WriteOutcome,

    /// Number of imported projects in the file
    pub imports: usize,

    /// Merge warnings
    pub warnings: Vec<MergeWarning>,
}

/// Walk and merge, failing if any import has not been fetched.
pub fn resolve_merged(ws: &Workspace, registry: &Registry) -> Result<MergedConfig, ImportError> {
    let graph = walk(ws, registry)?;
    merge(&graph).ok_or_else(|| ImportError::IncompleteGraph {
        missing: graph.missing().to_vec(),
    })
}

/// Generate the imports file of the workspace's root project.
pub fn generate(ws: &Workspace, registry: &Registry) -> Result<GenResult> {
    let config = resolve_merged(ws, registry)?;
    let path = ws.imports_file_path();
    let outcome = emit(&config, &path)?;

    tracing::info!(
        "{} {} ({} import(s))",
        match outcome {
            WriteOutcome::Written => "wrote",
            WriteOutcome::Unchanged => "kept unchanged",
        },
        path.display(),
        config.imports.len()
    );

    Ok(GenResult {
        path,
        outcome,
        imports: config.imports.len(),
        warnings: config.warnings,
    })
}

/// Write the rendered configuration to `dest`, skipping unchanged content.
pub fn emit(config: &MergedConfig, dest: &Path) -> Result<WriteOutcome> {
    write_if_changed(dest, &render(config))
}

/// Render the merged configuration as CMake.
pub fn render(config: &MergedConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", GENERATED_HEADER);

    for (name, import) in &config.imports {
        let mut w = Writer::new(&mut out);
        w.blank();
        w.line(format!("# import: {}", name));

        if let Some(cond) = &import.condition {
            w.open_if(cond);
        }
        if let Some(group) = &import.group {
            w.line(format!("set(QUAY_IMPORT_GROUP {})", quote(group)));
        }
        for dir in &import.header_dirs {
            w.line(format!("include_directories({})", quote_path(dir)));
        }
        for (dir, cond) in &import.conditional_header_dirs {
            w.open_if(cond);
            w.line(format!("include_directories({})", quote_path(dir)));
            w.close_if();
        }
        for dir in &import.lib_dirs {
            w.line(format!("link_directories({})", quote_path(dir)));
        }
        for (key, value) in &import.defines {
            let define = if value.is_empty() {
                key.clone()
            } else {
                format!("{}={}", key, value)
            };
            w.line(format!("add_compile_definitions({})", quote(&define)));
        }
        for (source_dir, build_subdir) in &import.modules {
            w.line(format!(
                "add_subdirectory({} {})",
                quote_path(source_dir),
                quote(build_subdir)
            ));
        }
        if import.group.is_some() {
            w.line("unset(QUAY_IMPORT_GROUP)");
        }
        if import.condition.is_some() {
            w.close_if();
        }
    }

    out
}

/// Line writer tracking `if` nesting.
struct Writer<'a> {
    out: &'a mut String,
    depth: usize,
}

impl<'a> Writer<'a> {
    fn new(out: &'a mut String) -> Self {
        Writer { out, depth: 0 }
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn line(&mut self, line: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("    ");
        }
        self.out.push_str(line.as_ref());
        self.out.push('\n');
    }

    fn open_if(&mut self, cond: &str) {
        self.line(format!("if ({})", cond));
        self.depth += 1;
    }

    fn close_if(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("endif()");
    }
}

/// Quote a CMake string argument.
fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn quote_path(path: &Path) -> String {
    quote(&to_forward_slashes(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::MergedImport;
    use crate::test_support::{assertions, manifests, ProjectFixture, TestWorkspace};
    use indexmap::IndexMap;

    #[test]
    fn test_render_entry() {
        let mut imports = IndexMap::new();
        imports.insert(
            "libA".to_string(),
            MergedImport {
                modules: [(PathBuf::from("/ws/libA/src/core"), "libA_core".to_string())]
                    .into_iter()
                    .collect(),
                header_dirs: vec![PathBuf::from("/ws/libA/include")],
                conditional_header_dirs: [(PathBuf::from("/ws/libA/posix"), "UNIX".to_string())]
                    .into_iter()
                    .collect(),
                lib_dirs: vec![PathBuf::from("/ws/libA/lib")],
                defines: [
                    ("LIBA_NAME".to_string(), "\"a\"".to_string()),
                    ("LIBA_ON".to_string(), String::new()),
                ]
                .into_iter()
                .collect(),
                condition: Some("QUAY_LINUX".to_string()),
                group: Some("Libs".to_string()),
            },
        );
        let config = MergedConfig {
            imports,
            warnings: Vec::new(),
        };

        let expected = r#"# machine generated by quay, do not edit, do not commit

# import: libA
if (QUAY_LINUX)
    set(QUAY_IMPORT_GROUP "Libs")
    include_directories("/ws/libA/include")
    if (UNIX)
        include_directories("/ws/libA/posix")
    endif()
    link_directories("/ws/libA/lib")
    add_compile_definitions("LIBA_NAME=\"a\"")
    add_compile_definitions("LIBA_ON")
    add_subdirectory("/ws/libA/src/core" "libA_core")
    unset(QUAY_IMPORT_GROUP)
endif()
"#;
        assert_eq!(render(&config), expected);
    }

    #[test]
    fn test_render_empty_entry_is_listed() {
        let mut imports = IndexMap::new();
        imports.insert("empty".to_string(), MergedImport::default());
        let rendered = render(&MergedConfig {
            imports,
            warnings: Vec::new(),
        });
        assert!(rendered.starts_with(GENERATED_HEADER));
        assert!(rendered.contains("# import: empty\n"));
    }

    #[test]
    fn test_generate_is_idempotent() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("app").with_manifest(manifests::imports(&["libA"])));
        tws.add(ProjectFixture::library("libA"));
        let ws = tws.workspace("app");
        let registry = Registry::new();

        let first = generate(&ws, &registry).unwrap();
        assert_eq!(first.outcome, WriteOutcome::Written);
        assert_eq!(first.imports, 1);
        let content = std::fs::read_to_string(&first.path).unwrap();

        let second = generate(&ws, &registry).unwrap();
        assert_eq!(second.outcome, WriteOutcome::Unchanged);
        assert_eq!(std::fs::read_to_string(&second.path).unwrap(), content);

        let include = to_forward_slashes(&tws.project_dir("libA").join("include"));
        assert!(content.contains(&format!("include_directories(\"{}\")", include)));
        assert!(content.contains("\"libA_libA\")"));
    }

    #[test]
    fn test_generate_incomplete_graph_fails() {
        let tws = TestWorkspace::new();
        tws.add(ProjectFixture::new("app").with_manifest(manifests::imports(&["libA"])));
        let ws = tws.workspace("app");

        let result = generate(&ws, &Registry::new());
        let err = result.as_ref().unwrap_err();
        match err.downcast_ref::<ImportError>() {
            Some(ImportError::IncompleteGraph { missing }) => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].name, "libA");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!ws.imports_file_path().exists());
        assertions::assert_error_contains(result, "have not been fetched");
    }
}
