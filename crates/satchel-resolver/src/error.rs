use miette::Diagnostic;
use thiserror::Error;

use satchel_registry::RegistryError;

use crate::conflict::Conflict;

/// Typed failure modes of dependency resolution.
///
/// Resolution is all-or-nothing: none of these is ever accompanied by a
/// partial [`Resolution`](crate::resolver::Resolution).
#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    /// The graph contains at least one dependency cycle. `packages` holds,
    /// sorted, every node whose in-degree never reached zero during the
    /// topological sort.
    #[error("circular dependency detected among: {}", .packages.join(", "))]
    Cycle { packages: Vec<String> },

    /// One or more plugins resolved to versions violating a dependent's
    /// declared constraint. Every conflict in the graph is collected before
    /// this error is raised.
    #[error("{}", format_conflicts(.conflicts))]
    Conflict { conflicts: Vec<Conflict> },

    /// No published version satisfies the requested constraint.
    #[error("no version of '{package}' satisfies '{constraint}'{}", format_available(.available))]
    VersionNotFound {
        package: String,
        constraint: String,
        available: Vec<String>,
    },

    /// The package does not exist in the consulted registry.
    #[error("plugin '{package}' not found{}", format_registry(.registry))]
    PackageNotFound {
        package: String,
        registry: Option<String>,
    },

    /// The project configuration names no source for a package, or names a
    /// registry it never declares.
    #[error("configuration error: {message}")]
    #[diagnostic(help("declare the plugin's source or registry in satchel.toml"))]
    Configuration { message: String },

    /// A registry transport failed.
    #[error("registry failure: {message}")]
    Registry { message: String },
}

impl From<RegistryError> for ResolveError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::PackageNotFound { package, registry } => {
                Self::PackageNotFound { package, registry }
            }
            RegistryError::VersionNotFound {
                package,
                constraint,
                available,
            } => Self::VersionNotFound {
                package,
                constraint,
                available,
            },
            RegistryError::UnsupportedScheme { .. } => Self::Configuration {
                message: err.to_string(),
            },
            other => Self::Registry {
                message: other.to_string(),
            },
        }
    }
}

fn format_conflicts(conflicts: &[Conflict]) -> String {
    if conflicts.is_empty() {
        return "unknown dependency conflict".to_string();
    }
    let blocks: Vec<String> = conflicts.iter().map(Conflict::to_string).collect();
    format!(
        "dependency conflicts detected ({}):\n{}",
        conflicts.len(),
        blocks.join("\n")
    )
}

fn format_available(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}

fn format_registry(registry: &Option<String>) -> String {
    match registry {
        Some(name) => format!(" in registry '{name}'"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_display() {
        let err = ResolveError::Cycle {
            packages: vec!["a".into(), "b".into(), "c".into()],
        };
        assert_eq!(err.to_string(), "circular dependency detected among: a, b, c");
    }

    #[test]
    fn empty_conflict_list_has_fallback() {
        let err = ResolveError::Conflict {
            conflicts: Vec::new(),
        };
        assert_eq!(err.to_string(), "unknown dependency conflict");
    }

    #[test]
    fn version_not_found_display() {
        let err = ResolveError::VersionNotFound {
            package: "linter".into(),
            constraint: "^9.0".into(),
            available: vec!["1.0.0".into()],
        };
        assert_eq!(
            err.to_string(),
            "no version of 'linter' satisfies '^9.0' (available: 1.0.0)"
        );
    }

    #[test]
    fn package_not_found_display() {
        let err = ResolveError::PackageNotFound {
            package: "ghost".into(),
            registry: None,
        };
        assert_eq!(err.to_string(), "plugin 'ghost' not found");
    }

    #[test]
    fn registry_errors_convert() {
        let err: ResolveError = RegistryError::PackageNotFound {
            package: "ghost".into(),
            registry: Some("main".into()),
        }
        .into();
        assert!(matches!(err, ResolveError::PackageNotFound { .. }));

        let err: ResolveError = RegistryError::Other {
            message: "connection reset".into(),
        }
        .into();
        assert!(matches!(err, ResolveError::Registry { .. }));
    }
}
