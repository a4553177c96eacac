//! Import graph walker.
//!
//! Visits the root project and everything it transitively imports. The
//! traversal is an explicit-stack depth-first search: a project is marked
//! visited when first reached and inserted into the graph after all of its
//! imports, which yields dependency-first order. Revisits (diamonds and
//! cycles) are no-ops.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::core::manifest::Manifest;
use crate::core::project::{ensure_valid_project_dir, project_name_from_location};
use crate::core::Workspace;
use crate::resolver::errors::{ImportError, MissingProject};
use crate::resolver::graph::{ImportGraph, ProjectNode, ResolvedImport};
use crate::resolver::registry::Registry;

/// A project whose imports are still being visited.
struct Frame {
    node: ProjectNode,
    next: usize,
}

/// Walk the import graph of the workspace's root project.
///
/// Imported projects missing from disk are recorded in the graph and the
/// walk continues; check [`ImportGraph::is_complete`]. Unparsable
/// manifests, unresolvable imports and directories that exist but are not
/// projects are fatal.
pub fn walk(ws: &Workspace, registry: &Registry) -> Result<ImportGraph, ImportError> {
    let mut graph = ImportGraph::new(ws.name());
    let mut visited: HashSet<String> = HashSet::new();

    visited.insert(ws.name().to_string());
    let root = load_project(ws, registry, ws.name(), ws.root().to_path_buf(), None)?;
    let mut stack = vec![Frame {
        node: root,
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(import) = frame.node.imports.get(frame.next).cloned() else {
            if let Some(done) = stack.pop() {
                tracing::debug!("resolved project `{}`", done.node.name);
                graph.add_project(done.node);
            }
            continue;
        };
        frame.next += 1;
        let importer = frame.node.name.clone();

        if !visited.insert(import.name.clone()) {
            tracing::debug!(
                "skipping `{}` imported by `{}`: already visited",
                import.name,
                importer
            );
            continue;
        }

        let dir = ws.project_dir(&import.name);
        if !dir.exists() {
            tracing::debug!(
                "imported project `{}` not found at {}",
                import.name,
                dir.display()
            );
            graph.add_missing(MissingProject {
                name: import.name.clone(),
                location: import.location.clone(),
                importer,
                expected_dir: dir,
            });
            continue;
        }

        let node = load_project(ws, registry, &import.name, dir, Some(import.location))?;
        stack.push(Frame { node, next: 0 });
    }

    graph.link_imports();

    if !graph.is_complete() {
        tracing::debug!(
            "import graph of `{}` is incomplete: {} project(s) missing",
            ws.name(),
            graph.missing().len()
        );
    }

    Ok(graph)
}

/// Load a project's manifest and resolve its imports.
fn load_project(
    ws: &Workspace,
    registry: &Registry,
    name: &str,
    project_dir: PathBuf,
    source_location: Option<String>,
) -> Result<ProjectNode, ImportError> {
    ensure_valid_project_dir(&project_dir)?;
    let manifest = Manifest::load(&project_dir, ws.default_branch())?;

    let mut imports = Vec::with_capacity(manifest.imports.len());
    for (key, spec) in &manifest.imports {
        let location = registry
            .resolve_location(&spec.location)
            .map_err(|e| e.in_import(name, key))?;

        let imported = project_name_from_location(&location).ok_or_else(|| {
            ImportError::InvalidImport {
                project: name.to_string(),
                import: key.clone(),
                location: location.clone(),
                reason: "cannot derive a project name from the source location".to_string(),
            }
        })?;

        imports.push(ResolvedImport {
            key: key.clone(),
            name: imported,
            location,
            spec: spec.clone(),
        });
    }

    Ok(ProjectNode {
        name: name.to_string(),
        project_dir,
        source_location,
        manifest,
        imports,
    })
}
