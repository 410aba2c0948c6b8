//! Dependency graph construction, deterministic ordering, and cycle
//! detection.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::error::ResolveError;

/// A plugin in the dependency graph.
///
/// Only the name is known at insertion time; resolution stamps the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginNode {
    pub name: String,
    pub version: Option<String>,
    pub constraint: Option<String>,
    pub source: Option<String>,
    pub registry: Option<String>,
}

impl fmt::Display for PluginNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{v}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A directed graph of named plugins. An edge parent→child carries the
/// version constraint the parent declared on the child.
pub struct DependencyGraph {
    graph: DiGraph<PluginNode, String>,
    /// Lookup from plugin name to node index.
    index: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Add or retrieve a node. If the name already exists, returns the
    /// existing index; prior mutations are preserved.
    pub fn add_node(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(PluginNode {
            name: name.to_string(),
            ..PluginNode::default()
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Record that `parent` depends on `child` under `constraint`.
    ///
    /// Both nodes are created if absent. Re-adding the same edge replaces
    /// the constraint.
    pub fn add_dependency(&mut self, parent: &str, child: &str, constraint: &str) {
        let parent_idx = self.add_node(parent);
        let child_idx = self.add_node(child);
        self.graph
            .update_edge(parent_idx, child_idx, constraint.to_string());
    }

    /// Stamp resolution results onto an existing (or new) node.
    pub fn set_resolved(
        &mut self,
        name: &str,
        version: &str,
        constraint: &str,
        source: &str,
        registry: Option<&str>,
    ) {
        let idx = self.add_node(name);
        let node = &mut self.graph[idx];
        node.version = Some(version.to_string());
        node.constraint = Some(constraint.to_string());
        node.source = Some(source.to_string());
        node.registry = registry.map(str::to_string);
    }

    /// Look up a node by name.
    pub fn get(&self, name: &str) -> Option<&PluginNode> {
        self.index.get(name).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All plugin names, sorted.
    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        names.sort();
        names
    }

    /// Direct dependencies of `name` with their constraints, sorted by
    /// dependency name. Absent names yield an empty list.
    pub fn dependencies_of(&self, name: &str) -> Vec<(String, String)> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Direct dependents of `name` with the constraint each declared on it,
    /// sorted by dependent name. Absent names yield an empty list.
    pub fn dependents_of(&self, name: &str) -> Vec<(String, String)> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<(String, String)> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut result: Vec<(String, String)> = self
            .graph
            .edges_directed(idx, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                (self.graph[other].name.clone(), edge.weight().clone())
            })
            .collect();
        result.sort();
        result
    }

    /// Number of plugins in the graph.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kahn's algorithm, returning plugin names in
    /// dependencies-before-dependents order.
    ///
    /// The in-degree of a node is the number of distinct plugins depending
    /// on it. Ties break lexicographically, so the order is deterministic
    /// regardless of insertion order. A cycle aborts with
    /// [`ResolveError::Cycle`] listing, sorted, every node whose in-degree
    /// never reached zero.
    pub fn topological_sort(&self) -> Result<Vec<String>, ResolveError> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                (
                    idx,
                    self.graph.edges_directed(idx, Direction::Incoming).count(),
                )
            })
            .collect();

        let mut ready: BTreeSet<String> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&idx, _)| self.graph[idx].name.clone())
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(name) = ready.pop_first() {
            let Some(&idx) = self.index.get(&name) else {
                continue;
            };
            order.push(name);
            for edge in self.graph.edges_directed(idx, Direction::Outgoing) {
                let child = edge.target();
                if let Some(degree) = in_degree.get_mut(&child) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        ready.insert(self.graph[child].name.clone());
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let mut packages: Vec<String> = in_degree
                .iter()
                .filter(|(_, &degree)| degree > 0)
                .map(|(&idx, _)| self.graph[idx].name.clone())
                .collect();
            packages.sort();
            return Err(ResolveError::Cycle { packages });
        }

        order.reverse();
        Ok(order)
    }

    /// Render the graph as a forest, one tree per plugin nothing depends
    /// on, with box-drawing connectors. Shared subtrees repeat; revisits on
    /// a path are cut.
    pub fn render_tree(&self) -> String {
        let mut output = String::new();
        let mut roots: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        roots.sort_by(|a, b| self.graph[*a].name.cmp(&self.graph[*b].name));

        for root in roots {
            output.push_str(&format!("{}\n", self.graph[root]));
            let mut visited = HashSet::new();
            visited.insert(root);
            let children = self.sorted_children(root);
            let count = children.len();
            for (i, &child) in children.iter().enumerate() {
                self.render_subtree(&mut output, child, "", i == count - 1, &mut visited);
            }
        }

        output
    }

    fn sorted_children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| edge.target())
            .collect();
        children.sort_by(|a, b| self.graph[*a].name.cmp(&self.graph[*b].name));
        children
    }

    fn render_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let children = self.sorted_children(idx);
        let count = children.len();
        for (i, &child) in children.iter().enumerate() {
            self.render_subtree(output, child, &child_prefix, i == count - 1, visited);
        }

        visited.remove(&idx);
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
