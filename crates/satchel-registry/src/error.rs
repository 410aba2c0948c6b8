use miette::Diagnostic;
use thiserror::Error;

/// Errors produced by registry lookups and transport construction.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    /// The registry has no plugin by that name.
    #[error("plugin '{package}' not found{}", in_registry(.registry))]
    PackageNotFound {
        package: String,
        registry: Option<String>,
    },

    /// The plugin exists, but no published version satisfies the constraint.
    #[error("no version of '{package}' satisfies '{constraint}'{}", listing(.available))]
    VersionNotFound {
        package: String,
        constraint: String,
        available: Vec<String>,
    },

    /// No transport is registered for the source's URL scheme.
    #[error("no registry transport registered for scheme '{scheme}'")]
    #[diagnostic(help("register a builder for this scheme on the RegistryFactory"))]
    UnsupportedScheme { scheme: String },

    /// Underlying I/O failure while reading the registry.
    #[error("registry I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport-specific failure.
    #[error("registry error: {message}")]
    Other { message: String },
}

fn in_registry(registry: &Option<String>) -> String {
    match registry {
        Some(name) => format!(" in registry '{name}'"),
        None => String::new(),
    }
}

fn listing(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_not_found_display() {
        let err = RegistryError::PackageNotFound {
            package: "linter".into(),
            registry: Some("internal".into()),
        };
        assert_eq!(
            err.to_string(),
            "plugin 'linter' not found in registry 'internal'"
        );

        let bare = RegistryError::PackageNotFound {
            package: "linter".into(),
            registry: None,
        };
        assert_eq!(bare.to_string(), "plugin 'linter' not found");
    }

    #[test]
    fn version_not_found_display_lists_available() {
        let err = RegistryError::VersionNotFound {
            package: "linter".into(),
            constraint: "^3.0".into(),
            available: vec!["1.0.0".into(), "2.1.0".into()],
        };
        assert_eq!(
            err.to_string(),
            "no version of 'linter' satisfies '^3.0' (available: 1.0.0, 2.1.0)"
        );
    }
}
