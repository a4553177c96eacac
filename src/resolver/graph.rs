//! ImportGraph - the resolved project graph of one workspace.
//!
//! Built by the walker, read-only afterwards. Projects are kept in
//! dependency-first order: every project appears after the projects it
//! imports, except where an import cycle makes that impossible.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::core::manifest::{Exports, ImportSpec, Manifest};
use crate::resolver::errors::MissingProject;

/// An import with its location resolved and target project named.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedImport {
    /// Key of the import in the manifest
    pub key: String,

    /// Canonical name of the imported project
    pub name: String,

    /// Source location after registry lookup
    pub location: String,

    /// The import entry as declared
    pub spec: ImportSpec,
}

/// A project visited by the walker.
#[derive(Debug, Clone)]
pub struct ProjectNode {
    /// Project name
    pub name: String,

    /// Project directory on disk
    pub project_dir: PathBuf,

    /// Location the project was imported from (None for the root)
    pub source_location: Option<String>,

    /// The parsed manifest
    pub manifest: Manifest,

    /// Imports in manifest order
    pub imports: Vec<ResolvedImport>,
}

impl ProjectNode {
    /// The project's exports.
    pub fn exports(&self) -> &Exports {
        &self.manifest.exports
    }

    /// Look up an import by target project name.
    pub fn import(&self, name: &str) -> Option<&ResolvedImport> {
        self.imports.iter().find(|i| i.name == name)
    }
}

/// The import graph.
#[derive(Debug, Clone)]
pub struct ImportGraph {
    /// Projects in dependency-first order
    nodes: IndexMap<String, ProjectNode>,

    /// Import edges, importer -> imported
    graph: DiGraph<String, ()>,

    /// Map from project name to node index
    name_to_node: HashMap<String, NodeIndex>,

    /// Root project name
    root: String,

    /// Imported projects not found on disk
    missing: Vec<MissingProject>,
}

impl ImportGraph {
    /// Create an empty graph for the named root project.
    pub fn new(root: impl Into<String>) -> Self {
        ImportGraph {
            nodes: IndexMap::new(),
            graph: DiGraph::new(),
            name_to_node: HashMap::new(),
            root: root.into(),
            missing: Vec::new(),
        }
    }

    /// Add a project. The first insertion of a name wins.
    pub fn add_project(&mut self, node: ProjectNode) {
        if self.nodes.contains_key(&node.name) {
            return;
        }

        let index = self.graph.add_node(node.name.clone());
        self.name_to_node.insert(node.name.clone(), index);
        self.nodes.insert(node.name.clone(), node);
    }

    /// Add an import edge between two known projects.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if let (Some(&from_node), Some(&to_node)) =
            (self.name_to_node.get(from), self.name_to_node.get(to))
        {
            if !self.graph.contains_edge(from_node, to_node) {
                self.graph.add_edge(from_node, to_node, ());
            }
        }
    }

    /// Record an imported project that is not on disk.
    pub fn add_missing(&mut self, missing: MissingProject) {
        if !self.missing.iter().any(|m| m.name == missing.name) {
            self.missing.push(missing);
        }
    }

    /// Connect every project to the imports that were found on disk.
    pub(crate) fn link_imports(&mut self) {
        let edges: Vec<(String, String)> = self
            .nodes
            .values()
            .flat_map(|node| {
                node.imports
                    .iter()
                    .map(move |import| (node.name.clone(), import.name.clone()))
            })
            .collect();

        for (from, to) in edges {
            self.add_edge(&from, &to);
        }
    }

    /// True when every transitively imported project exists on disk.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Imported projects that have not been fetched.
    pub fn missing(&self) -> &[MissingProject] {
        &self.missing
    }

    /// Root project name.
    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// Root project node.
    pub fn root(&self) -> Option<&ProjectNode> {
        self.nodes.get(&self.root)
    }

    /// Get a project by name.
    pub fn get(&self, name: &str) -> Option<&ProjectNode> {
        self.nodes.get(name)
    }

    /// Check if a project is in the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Iterate over projects in dependency-first order.
    pub fn projects(&self) -> impl Iterator<Item = &ProjectNode> {
        self.nodes.values()
    }

    /// Number of projects.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Directory of a project in the graph.
    pub fn project_dir(&self, name: &str) -> Option<&Path> {
        self.nodes.get(name).map(|n| n.project_dir.as_path())
    }

    /// Direct imports of a project that are on disk, in manifest order.
    pub fn deps(&self, name: &str) -> Vec<&str> {
        match self.nodes.get(name) {
            Some(node) => node
                .imports
                .iter()
                .filter(|i| self.nodes.contains_key(&i.name))
                .map(|i| i.name.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Projects that import the given project.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        if let Some(&node) = self.name_to_node.get(name) {
            let mut dependents: Vec<&str> = self
                .graph
                .neighbors_directed(node, petgraph::Direction::Incoming)
                .map(|n| self.graph[n].as_str())
                .collect();
            dependents.sort_by_key(|d| self.nodes.get_index_of(*d));
            dependents
        } else {
            Vec::new()
        }
    }

    /// Import cycles, each listed in graph order.
    ///
    /// Cycles are legal; the walker visits each project once regardless.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self.graph.contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut names: Vec<String> =
                    component.iter().map(|&n| self.graph[n].clone()).collect();
                names.sort_by_key(|n| self.nodes.get_index_of(n));
                names
            })
            .collect();

        cycles.sort_by_key(|c| c.first().and_then(|n| self.nodes.get_index_of(n)));
        cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::DEFAULT_BRANCH;

    fn node(name: &str, imports: &[&str]) -> ProjectNode {
        let path = PathBuf::from(format!("/ws/{name}/Quay.toml"));
        let manifest = Manifest::parse("", &path, DEFAULT_BRANCH).unwrap();
        ProjectNode {
            name: name.to_string(),
            project_dir: PathBuf::from(format!("/ws/{name}")),
            source_location: None,
            manifest,
            imports: imports
                .iter()
                .map(|i| ResolvedImport {
                    key: i.to_string(),
                    name: i.to_string(),
                    location: format!("https://example.com/{i}.git"),
                    spec: ImportSpec {
                        location: format!("https://example.com/{i}.git"),
                        branch: DEFAULT_BRANCH.to_string(),
                        rev: None,
                        depth: None,
                        condition: None,
                        group: None,
                    },
                })
                .collect(),
        }
    }

    fn graph(nodes: Vec<ProjectNode>, root: &str) -> ImportGraph {
        let mut graph = ImportGraph::new(root);
        for n in nodes {
            graph.add_project(n);
        }
        graph.link_imports();
        graph
    }

    #[test]
    fn test_graph_basic() {
        let g = graph(vec![node("b", &[]), node("a", &["b"])], "a");

        assert_eq!(g.len(), 2);
        assert!(g.is_complete());
        assert_eq!(g.deps("a"), vec!["b"]);
        assert_eq!(g.dependents("b"), vec!["a"]);
        assert_eq!(g.root().map(|r| r.name.as_str()), Some("a"));
        assert!(g.cycles().is_empty());
    }

    #[test]
    fn test_first_insertion_wins() {
        let mut g = ImportGraph::new("a");
        g.add_project(node("a", &["b"]));
        g.add_project(node("a", &[]));
        assert_eq!(g.len(), 1);
        assert_eq!(g.get("a").unwrap().imports.len(), 1);
    }

    #[test]
    fn test_cycles_detected() {
        let g = graph(
            vec![node("c", &["a"]), node("b", &["c"]), node("a", &["b"]), node("d", &["d"])],
            "a",
        );

        let cycles = g.cycles();
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0], vec!["c", "b", "a"]);
        assert_eq!(cycles[1], vec!["d"]);
    }

    #[test]
    fn test_missing_deduplicated() {
        let mut g = ImportGraph::new("a");
        for importer in ["a", "b"] {
            g.add_missing(MissingProject {
                name: "x".to_string(),
                location: "https://example.com/x.git".to_string(),
                importer: importer.to_string(),
                expected_dir: PathBuf::from("/ws/x"),
            });
        }
        assert!(!g.is_complete());
        assert_eq!(g.missing().len(), 1);
        assert_eq!(g.missing()[0].importer, "a");
    }
}
