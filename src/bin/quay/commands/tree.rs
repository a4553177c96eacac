//! `quay tree` command

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::TreeArgs;
use quay::resolver::{walk, ImportGraph};
use quay::util::{GlobalContext, Shell};

pub fn execute(args: TreeArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let project = ctx.project()?;
    let graph = walk(&project.workspace, &project.registry)?;

    for line in render_tree(&graph, args.depth.unwrap_or(usize::MAX)) {
        shell.println(line);
    }

    for missing in graph.missing() {
        shell.diagnostic(&missing.to_diagnostic());
    }

    Ok(())
}

/// Render the import tree of the root project, one line per entry.
pub fn render_tree(graph: &ImportGraph, max_depth: usize) -> Vec<String> {
    let mut lines = vec![graph.root_name().to_string()];
    let mut seen = HashSet::from([graph.root_name()]);
    print_children(graph, graph.root_name(), "", 1, max_depth, &mut seen, &mut lines);
    lines
}

fn print_children<'a>(
    graph: &'a ImportGraph,
    name: &'a str,
    indent: &str,
    depth: usize,
    max_depth: usize,
    seen: &mut HashSet<&'a str>,
    lines: &mut Vec<String>,
) {
    if depth > max_depth {
        return;
    }
    let Some(node) = graph.get(name) else {
        return;
    };

    let count = node.imports.len();
    for (i, import) in node.imports.iter().enumerate() {
        let last = i + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        let child = import.name.as_str();

        if !graph.contains(child) {
            lines.push(format!("{}{}{} (not fetched)", indent, connector, child));
            continue;
        }

        // Repeats are listed once and not expanded again.
        if !seen.insert(child) {
            lines.push(format!("{}{}{} (*)", indent, connector, child));
            continue;
        }
        lines.push(format!("{}{}{}", indent, connector, child));

        let child_indent = format!("{}{}", indent, if last { "    " } else { "│   " });
        print_children(graph, child, &child_indent, depth + 1, max_depth, seen, lines);
    }
}
