//! `quay list` command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexMap;
use serde::Serialize;

use crate::cli::{ListArgs, ListKind};
use quay::ops::resolve_merged;
use quay::resolver::{walk, ImportGraph, MergedConfig, MissingProject, ResolvedImport};
use quay::util::fs::to_forward_slashes;
use quay::util::{GlobalContext, Shell};

pub fn execute(args: ListArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    match args.what {
        ListKind::Imports => list_imports(ctx, shell),
        ListKind::Exports => list_exports(ctx, shell),
        ListKind::Registry => list_registry(ctx, shell),
    }
}

#[derive(Serialize)]
struct ProjectListing<'a> {
    name: &'a str,
    dir: &'a PathBuf,
    location: Option<&'a str>,
    imports: &'a [ResolvedImport],
}

#[derive(Serialize)]
struct ImportsListing<'a> {
    projects: Vec<ProjectListing<'a>>,
    missing: Vec<MissingListing<'a>>,
}

#[derive(Serialize)]
struct MissingListing<'a> {
    name: &'a str,
    location: &'a str,
    importer: &'a str,
    expected_dir: &'a PathBuf,
}

fn list_imports(ctx: &GlobalContext, shell: &Shell) -> Result<()> {
    let project = ctx.project()?;
    let graph = walk(&project.workspace, &project.registry)?;

    if shell.is_json() {
        shell.print_json(&imports_listing(&graph));
        return Ok(());
    }

    for line in render_imports(&graph) {
        shell.println(line);
    }
    Ok(())
}

fn imports_listing(graph: &ImportGraph) -> ImportsListing<'_> {
    ImportsListing {
        projects: graph
            .projects()
            .map(|node| ProjectListing {
                name: &node.name,
                dir: &node.project_dir,
                location: node.source_location.as_deref(),
                imports: &node.imports,
            })
            .collect(),
        missing: graph.missing().iter().map(missing_listing).collect(),
    }
}

fn missing_listing(missing: &MissingProject) -> MissingListing<'_> {
    MissingListing {
        name: &missing.name,
        location: &missing.location,
        importer: &missing.importer,
        expected_dir: &missing.expected_dir,
    }
}

/// Projects in graph order, each followed by its imports.
fn render_imports(graph: &ImportGraph) -> Vec<String> {
    let mut lines = Vec::new();

    for node in graph.projects() {
        lines.push(format!("{} ({})", node.name, node.project_dir.display()));
        for import in &node.imports {
            let mut line = format!("    {} -> {}", import.name, import.location);
            line.push_str(&format!(" [branch: {}]", import.spec.branch));
            if let Some(rev) = &import.spec.rev {
                line.push_str(&format!(" [rev: {}]", rev));
            }
            if let Some(cond) = &import.spec.condition {
                line.push_str(&format!(" [if: {}]", cond));
            }
            if let Some(group) = &import.spec.group {
                line.push_str(&format!(" [group: {}]", group));
            }
            if !graph.contains(&import.name) {
                line.push_str(" (not fetched)");
            }
            lines.push(line);
        }
    }

    lines
}

fn list_exports(ctx: &GlobalContext, shell: &Shell) -> Result<()> {
    let project = ctx.project()?;
    let merged = resolve_merged(&project.workspace, &project.registry)?;

    if shell.is_json() {
        shell.print_json(&merged);
        return Ok(());
    }

    for line in render_exports(&merged) {
        shell.println(line);
    }
    for warning in &merged.warnings {
        shell.diagnostic(&warning.to_diagnostic());
    }
    Ok(())
}

/// The merged configuration, one block per imported project.
fn render_exports(merged: &MergedConfig) -> Vec<String> {
    let mut lines = Vec::new();

    for (name, import) in &merged.imports {
        let mut header = name.clone();
        if let Some(cond) = &import.condition {
            header.push_str(&format!(" [if: {}]", cond));
        }
        if let Some(group) = &import.group {
            header.push_str(&format!(" [group: {}]", group));
        }
        lines.push(header);

        for dir in &import.header_dirs {
            lines.push(format!("    header dir: {}", to_forward_slashes(dir)));
        }
        for (dir, cond) in &import.conditional_header_dirs {
            lines.push(format!("    header dir: {} [if: {}]", to_forward_slashes(dir), cond));
        }
        for dir in &import.lib_dirs {
            lines.push(format!("    lib dir: {}", to_forward_slashes(dir)));
        }
        for (key, value) in &import.defines {
            if value.is_empty() {
                lines.push(format!("    define: {}", key));
            } else {
                lines.push(format!("    define: {}={}", key, value));
            }
        }
        for (dir, build_subdir) in &import.modules {
            lines.push(format!("    module: {} -> {}", to_forward_slashes(dir), build_subdir));
        }
    }

    lines
}

fn list_registry(ctx: &GlobalContext, shell: &Shell) -> Result<()> {
    // Inside a project its configuration may point at another registry.
    let config = ctx.load_config(ctx.find_project_root().ok().as_deref());
    let registry = ctx.load_registry(&config)?;

    if shell.is_json() {
        let entries: IndexMap<&str, &str> = registry.iter().collect();
        shell.print_json(&entries);
        return Ok(());
    }

    let width = registry.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, location) in registry.iter() {
        shell.println(format!("{:width$}  {}", name, location, width = width));
    }
    Ok(())
}
