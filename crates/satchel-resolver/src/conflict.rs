//! Conflict detection over a fully resolved dependency graph.

use std::collections::BTreeMap;
use std::fmt;

use satchel_core::version;

use crate::graph::DependencyGraph;
use crate::resolver::ResolvedPlugin;

/// A plugin whose resolved version violates at least one dependent's
/// declared constraint.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub package: String,
    /// Human-readable violations, one per dependent:
    /// `"app requires lib@^2.0.0"`.
    pub violations: Vec<String>,
    /// Known published versions, when the caller has them.
    pub available: Vec<String>,
    /// Non-binding remediation hint; the resolver does not search for an
    /// alternative version set.
    pub suggestion: String,
}

impl Conflict {
    pub fn new(package: &str, violations: Vec<String>) -> Self {
        Self {
            suggestion: format!(
                "align the constraints declared on '{package}' or pin an explicit version in satchel.toml"
            ),
            package: package.to_string(),
            violations,
            available: Vec::new(),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "conflict on '{}':", self.package)?;
        for violation in &self.violations {
            writeln!(f, "  {violation}")?;
        }
        if !self.available.is_empty() {
            writeln!(f, "  available versions: {}", self.available.join(", "))?;
        }
        write!(f, "  hint: {}", self.suggestion)
    }
}

/// Check every resolved plugin against the constraints its dependents
/// declared on it.
///
/// All conflicts across the whole graph are collected before returning;
/// detection is exhaustive, never fail-fast. Nodes without a resolution or
/// with an unparseable version are skipped, as are malformed constraints:
/// neither is a resolution failure at this layer.
pub fn detect_conflicts(
    graph: &DependencyGraph,
    resolved: &BTreeMap<String, ResolvedPlugin>,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for name in graph.node_names() {
        let Some(plugin) = resolved.get(&name) else {
            continue;
        };
        let Ok(resolved_version) = version::parse(&plugin.version) else {
            continue;
        };

        let mut violations = Vec::new();
        for (dependent, constraint) in graph.dependents_of(&name) {
            let Ok(req) = version::parse_constraint(&constraint) else {
                continue;
            };
            if !req.matches(&resolved_version) {
                violations.push(format!("{dependent} requires {name}@{constraint}"));
            }
        }

        if !violations.is_empty() {
            tracing::warn!(
                plugin = %name,
                version = %plugin.version,
                violations = violations.len(),
                "resolved version violates dependent constraints"
            );
            conflicts.push(Conflict::new(&name, violations));
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(entries: &[(&str, &str)]) -> BTreeMap<String, ResolvedPlugin> {
        entries
            .iter()
            .map(|(name, v)| {
                (
                    name.to_string(),
                    ResolvedPlugin {
                        name: name.to_string(),
                        version: v.to_string(),
                        source: String::new(),
                        registry: None,
                        constraint: "latest".to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn violated_constraint_yields_one_conflict() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "lib", "^2.0.0");
        let conflicts = detect_conflicts(&graph, &resolved(&[("app", "1.0.0"), ("lib", "1.5.0")]));
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].package, "lib");
        assert_eq!(conflicts[0].violations, ["app requires lib@^2.0.0"]);
    }

    #[test]
    fn satisfied_constraint_yields_no_conflict() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "lib", "^2.0.0");
        let conflicts = detect_conflicts(&graph, &resolved(&[("app", "1.0.0"), ("lib", "2.1.0")]));
        assert!(conflicts.is_empty());
    }

    #[test]
    fn all_violators_aggregate_under_one_conflict() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "lib", "^2.0.0");
        graph.add_dependency("tool", "lib", ">=3.0");
        graph.add_dependency("ok", "lib", ">=1.0");
        let conflicts = detect_conflicts(
            &graph,
            &resolved(&[
                ("app", "1.0.0"),
                ("tool", "1.0.0"),
                ("ok", "1.0.0"),
                ("lib", "1.5.0"),
            ]),
        );
        assert_eq!(conflicts.len(), 1);
        assert_eq!(
            conflicts[0].violations,
            ["app requires lib@^2.0.0", "tool requires lib@>=3.0"]
        );
    }

    #[test]
    fn conflicts_cover_the_whole_graph() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "alpha", "^2.0");
        graph.add_dependency("app", "beta", "^2.0");
        let conflicts = detect_conflicts(
            &graph,
            &resolved(&[("app", "1.0.0"), ("alpha", "1.0.0"), ("beta", "1.0.0")]),
        );
        let packages: Vec<&str> = conflicts.iter().map(|c| c.package.as_str()).collect();
        assert_eq!(packages, ["alpha", "beta"]);
    }

    #[test]
    fn malformed_constraint_is_skipped() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "lib", "not a constraint");
        let conflicts = detect_conflicts(&graph, &resolved(&[("app", "1.0.0"), ("lib", "1.5.0")]));
        assert!(conflicts.is_empty());
    }

    #[test]
    fn unresolved_node_is_skipped() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "lib", "^2.0.0");
        let conflicts = detect_conflicts(&graph, &resolved(&[("app", "1.0.0")]));
        assert!(conflicts.is_empty());
    }

    #[test]
    fn display_is_a_block_report() {
        let mut conflict = Conflict::new("lib", vec!["app requires lib@^2.0.0".to_string()]);
        conflict.available = vec!["1.5.0".to_string(), "2.1.0".to_string()];
        let block = conflict.to_string();
        assert!(block.starts_with("conflict on 'lib':\n"));
        assert!(block.contains("  app requires lib@^2.0.0\n"));
        assert!(block.contains("  available versions: 1.5.0, 2.1.0\n"));
        assert!(block.ends_with("hint: align the constraints declared on 'lib' or pin an explicit version in satchel.toml"));
    }
}
