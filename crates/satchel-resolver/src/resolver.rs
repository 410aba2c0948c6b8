//! Resolution: a breadth-first traversal binding each requested plugin to a
//! concrete version and source, followed by conflict detection and install
//! ordering.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use satchel_core::config::ProjectConfig;
use satchel_core::lockfile::{LockedPlugin, Lockfile};
use satchel_core::plugin::PluginSpec;
use satchel_core::version;
use satchel_registry::factory::{RegistryFactory, RegistrySource};
use satchel_registry::Registry;

use crate::conflict::detect_conflicts;
use crate::error::ResolveError;
use crate::graph::DependencyGraph;

/// Constraint recorded when a version was taken from the lock file.
pub const LOCKED_CONSTRAINT: &str = "locked";

/// The computed, conflict-free install plan. Created fresh per
/// [`Resolver::resolve`] call.
pub struct Resolution {
    /// Plugin names in dependencies-before-dependents order.
    pub install_order: Vec<String>,
    pub resolved: BTreeMap<String, ResolvedPlugin>,
    pub graph: DependencyGraph,
}

impl Resolution {
    /// Build a lock file recording this plan, preserving each plugin's
    /// known dependency list from the graph.
    pub fn to_lockfile(&self) -> Lockfile {
        let plugin = self
            .resolved
            .values()
            .map(|p| LockedPlugin {
                name: p.name.clone(),
                version: p.version.clone(),
                resolved: (!p.source.is_empty()).then(|| p.source.clone()),
                registry: p.registry.clone(),
                dependencies: self.graph.dependencies_of(&p.name).into_iter().collect(),
            })
            .collect();
        Lockfile { plugin }
    }
}

/// A single plugin bound to a concrete version and source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlugin {
    pub name: String,
    pub version: String,
    pub source: String,
    pub registry: Option<String>,
    /// The constraint actually used to select the version.
    pub constraint: String,
}

/// Declared dependencies of a plugin, as far as this layer can know them.
///
/// Dependency lists live in the lock file, written when a plugin was last
/// fetched. A plugin that has never been fetched is `Unknown`: it
/// contributes no edges in this pass, and its true dependencies only
/// surface on the next resolution after install. That gap is inherent to
/// resolving before fetching, so it is kept explicit instead of being
/// folded into an empty list.
enum DeclaredDeps {
    Known(BTreeMap<String, String>),
    Unknown,
}

fn declared_dependencies(lockfile: &Lockfile, name: &str) -> DeclaredDeps {
    match lockfile.get(name) {
        Some(locked) => DeclaredDeps::Known(locked.dependencies.clone()),
        None => DeclaredDeps::Unknown,
    }
}

/// Binds install requests to concrete versions using the project
/// configuration, the lock file, and registries.
///
/// The registry-connection cache lives for the resolver's lifetime and is
/// mutated without locking: a single instance is not safe for concurrent
/// `resolve` calls. The traversal has no timeout of its own; deadlines
/// belong at the registry boundary.
pub struct Resolver {
    config: ProjectConfig,
    lockfile: Lockfile,
    factory: RegistryFactory,
    /// Connections keyed by source URL or registry name.
    connections: HashMap<String, Arc<dyn Registry>>,
}

impl Resolver {
    pub fn new(config: ProjectConfig, lockfile: Lockfile) -> Self {
        Self::with_factory(config, lockfile, RegistryFactory::new())
    }

    pub fn with_factory(config: ProjectConfig, lockfile: Lockfile, factory: RegistryFactory) -> Self {
        Self {
            config,
            lockfile,
            factory,
            connections: HashMap::new(),
        }
    }

    /// Seed the connection cache with a ready-made registry under `key`
    /// (a source URL or registry name), bypassing the factory for it.
    pub fn with_registry(mut self, key: impl Into<String>, registry: Arc<dyn Registry>) -> Self {
        self.connections.insert(key.into(), registry);
        self
    }

    /// Resolve `specs` and their known transitive dependencies to a
    /// conflict-free, install-ordered plan.
    pub fn resolve(&mut self, specs: &[PluginSpec]) -> Result<Resolution, ResolveError> {
        let lockfile = self.lockfile.clone();
        self.resolve_all(specs, &lockfile)
    }

    /// Re-resolve `names` (every locked plugin when empty) against the
    /// constraints declared in the project configuration.
    ///
    /// The traversal runs against an empty lock file so locked versions
    /// never short-circuit; the stored lock file is left untouched.
    pub fn resolve_for_update(&mut self, names: &[String]) -> Result<Resolution, ResolveError> {
        let targets: Vec<String> = if names.is_empty() {
            self.lockfile.plugin_names()
        } else {
            names.to_vec()
        };
        let specs: Vec<PluginSpec> = targets.iter().map(|n| self.config.spec_for(n)).collect();
        self.resolve_all(&specs, &Lockfile::default())
    }

    fn resolve_all(
        &mut self,
        specs: &[PluginSpec],
        lockfile: &Lockfile,
    ) -> Result<Resolution, ResolveError> {
        tracing::debug!(roots = specs.len(), "starting resolution");
        let mut graph = DependencyGraph::new();
        let mut resolved: BTreeMap<String, ResolvedPlugin> = BTreeMap::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<PluginSpec> = specs.iter().cloned().collect();

        while let Some(spec) = queue.pop_front() {
            // Diamond dependencies: each name is bound at most once per call.
            if !visited.insert(spec.name.clone()) {
                continue;
            }

            let plugin = self.resolve_plugin(&spec, lockfile)?;
            graph.set_resolved(
                &spec.name,
                &plugin.version,
                &plugin.constraint,
                &plugin.source,
                plugin.registry.as_deref(),
            );

            match declared_dependencies(lockfile, &spec.name) {
                DeclaredDeps::Known(deps) => {
                    for (dep_name, constraint) in deps {
                        graph.add_dependency(&spec.name, &dep_name, &constraint);
                        if !visited.contains(&dep_name) {
                            queue.push_back(PluginSpec::new(dep_name));
                        }
                    }
                }
                DeclaredDeps::Unknown => {
                    tracing::debug!(
                        plugin = %spec.name,
                        "dependency list unknown until first fetch; contributing no edges"
                    );
                }
            }

            resolved.insert(spec.name.clone(), plugin);
        }

        let conflicts = detect_conflicts(&graph, &resolved);
        if !conflicts.is_empty() {
            return Err(ResolveError::Conflict { conflicts });
        }

        let install_order = graph.topological_sort()?;
        tracing::debug!(plugins = install_order.len(), "resolution complete");
        Ok(Resolution {
            install_order,
            resolved,
            graph,
        })
    }

    fn resolve_plugin(
        &mut self,
        spec: &PluginSpec,
        lockfile: &Lockfile,
    ) -> Result<ResolvedPlugin, ResolveError> {
        // An explicit version request always bypasses the lock.
        if spec.version.is_none() {
            if let Some(locked) = lockfile.get(&spec.name) {
                tracing::debug!(
                    plugin = %spec.name,
                    version = %locked.version,
                    "using locked version"
                );
                return Ok(ResolvedPlugin {
                    name: spec.name.clone(),
                    version: locked.version.clone(),
                    source: locked.resolved.clone().unwrap_or_default(),
                    registry: locked.registry.clone(),
                    constraint: LOCKED_CONSTRAINT.to_string(),
                });
            }
        }

        // Project-config defaults fill in whatever the spec omits.
        let entry = self.config.plugins.get(&spec.name);
        let source = spec
            .source
            .clone()
            .or_else(|| entry.and_then(|e| e.source().map(str::to_string)));
        let registry_name = spec
            .registry
            .clone()
            .or_else(|| entry.and_then(|e| e.registry().map(str::to_string)));
        let constraint = spec
            .version
            .clone()
            .or_else(|| entry.and_then(|e| e.version().map(str::to_string)))
            .unwrap_or_else(|| version::LATEST.to_string());

        let registry = self.connect(&spec.name, source.as_deref(), registry_name.as_deref())?;
        let binding = registry.resolve(&spec.name, &constraint)?;
        tracing::debug!(
            plugin = %spec.name,
            version = %binding.version,
            %constraint,
            "bound version"
        );

        Ok(ResolvedPlugin {
            name: spec.name.clone(),
            version: binding.version,
            source: binding.url,
            registry: registry_name,
            constraint,
        })
    }

    /// Obtain or create-and-cache the registry connection for a plugin's
    /// source URL or registry name.
    fn connect(
        &mut self,
        package: &str,
        source: Option<&str>,
        registry: Option<&str>,
    ) -> Result<Arc<dyn Registry>, ResolveError> {
        if let Some(url) = source {
            if let Some(connection) = self.connections.get(url) {
                return Ok(connection.clone());
            }
            let connection = self.factory.open(&RegistrySource::from_url(url))?;
            self.connections.insert(url.to_string(), connection.clone());
            return Ok(connection);
        }

        if let Some(name) = registry {
            if let Some(connection) = self.connections.get(name) {
                return Ok(connection.clone());
            }
            let entry =
                self.config
                    .registry(name)
                    .ok_or_else(|| ResolveError::Configuration {
                        message: format!(
                            "registry '{name}' (needed by '{package}') is not declared in satchel.toml"
                        ),
                    })?;
            let connection = self.factory.open(&RegistrySource {
                name: Some(name.to_string()),
                url: entry.url().to_string(),
                token: entry.token().map(str::to_string),
            })?;
            self.connections.insert(name.to_string(), connection.clone());
            return Ok(connection);
        }

        Err(ResolveError::Configuration {
            message: format!(
                "plugin '{package}' has no source or registry; declare one in satchel.toml"
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declared_dependencies_distinguish_unknown_from_empty() {
        let lockfile = Lockfile {
            plugin: vec![LockedPlugin {
                name: "leaf".to_string(),
                version: "1.0.0".to_string(),
                resolved: None,
                registry: None,
                dependencies: BTreeMap::new(),
            }],
        };
        assert!(matches!(
            declared_dependencies(&lockfile, "leaf"),
            DeclaredDeps::Known(ref deps) if deps.is_empty()
        ));
        assert!(matches!(
            declared_dependencies(&lockfile, "never-fetched"),
            DeclaredDeps::Unknown
        ));
    }

    #[test]
    fn resolution_to_lockfile_records_plan() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "lib", "^1.0");
        let mut resolved = BTreeMap::new();
        for (name, v) in [("app", "1.0.0"), ("lib", "1.4.0")] {
            resolved.insert(
                name.to_string(),
                ResolvedPlugin {
                    name: name.to_string(),
                    version: v.to_string(),
                    source: format!("fake://{name}/{v}"),
                    registry: Some("main".to_string()),
                    constraint: "latest".to_string(),
                },
            );
        }
        let resolution = Resolution {
            install_order: vec!["lib".to_string(), "app".to_string()],
            resolved,
            graph,
        };

        let lock = resolution.to_lockfile();
        let app = lock.get("app").unwrap();
        assert_eq!(app.version, "1.0.0");
        assert_eq!(app.resolved.as_deref(), Some("fake://app/1.0.0"));
        assert_eq!(app.dependencies["lib"], "^1.0");
        assert!(lock.get("lib").unwrap().dependencies.is_empty());
    }
}
