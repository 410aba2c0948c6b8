//! Transport construction: an explicit scheme → builder mapping.
//!
//! The mapping is injected at construction time rather than registered in a
//! process-wide table, so tests and embedders substitute transports without
//! global side effects.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::local::LocalRegistry;
use crate::{Registry, RegistryError};

/// Identity of a registry to connect to: a URL (or bare filesystem path),
/// optionally a declared name and access token from project configuration.
#[derive(Debug, Clone, Default)]
pub struct RegistrySource {
    pub name: Option<String>,
    pub url: String,
    pub token: Option<String>,
}

impl RegistrySource {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// The URL scheme, treating bare paths as `file`.
    pub fn scheme(&self) -> &str {
        match self.url.split_once("://") {
            Some((scheme, _)) => scheme,
            None => "file",
        }
    }
}

/// Builds a [`Registry`] connection for a [`RegistrySource`].
pub type RegistryBuilder =
    Arc<dyn Fn(&RegistrySource) -> Result<Arc<dyn Registry>, RegistryError> + Send + Sync>;

/// Creates registry connections from sources, dispatching on URL scheme.
#[derive(Clone)]
pub struct RegistryFactory {
    builders: BTreeMap<String, RegistryBuilder>,
}

impl RegistryFactory {
    /// A factory with the built-in `file` transport only.
    pub fn new() -> Self {
        let mut builders: BTreeMap<String, RegistryBuilder> = BTreeMap::new();
        builders.insert(
            "file".to_string(),
            Arc::new(|source: &RegistrySource| {
                let path = source.url.strip_prefix("file://").unwrap_or(&source.url);
                let name = source.name.clone().unwrap_or_else(|| "local".to_string());
                Ok(Arc::new(LocalRegistry::new(name, path)) as Arc<dyn Registry>)
            }),
        );
        Self { builders }
    }

    /// Register (or replace) the builder for a URL scheme.
    pub fn with_builder(
        mut self,
        scheme: impl Into<String>,
        builder: RegistryBuilder,
    ) -> Self {
        self.builders.insert(scheme.into(), builder);
        self
    }

    /// Open a connection for `source`.
    pub fn open(&self, source: &RegistrySource) -> Result<Arc<dyn Registry>, RegistryError> {
        let scheme = source.scheme();
        let builder =
            self.builders
                .get(scheme)
                .ok_or_else(|| RegistryError::UnsupportedScheme {
                    scheme: scheme.to_string(),
                })?;
        tracing::debug!(scheme, url = %source.url, "opening registry connection");
        builder(source)
    }
}

impl Default for RegistryFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResolvedVersion;

    struct StaticRegistry;

    impl Registry for StaticRegistry {
        fn name(&self) -> &str {
            "static"
        }

        fn resolve(&self, _: &str, _: &str) -> Result<ResolvedVersion, RegistryError> {
            Ok(ResolvedVersion {
                version: "1.0.0".into(),
                url: "static://x".into(),
            })
        }
    }

    #[test]
    fn scheme_of_bare_path_is_file() {
        assert_eq!(RegistrySource::from_url("/srv/registry").scheme(), "file");
        assert_eq!(
            RegistrySource::from_url("file:///srv/registry").scheme(),
            "file"
        );
        assert_eq!(
            RegistrySource::from_url("https://plugins.example.com").scheme(),
            "https"
        );
    }

    #[test]
    fn opens_local_registry_for_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("linter").join("1.0.0")).unwrap();
        let factory = RegistryFactory::new();

        let source = RegistrySource::from_url(dir.path().display().to_string());
        let registry = factory.open(&source).unwrap();
        assert_eq!(registry.resolve("linter", "latest").unwrap().version, "1.0.0");

        let prefixed = RegistrySource::from_url(format!("file://{}", dir.path().display()));
        assert!(factory.open(&prefixed).is_ok());
    }

    #[test]
    fn unregistered_scheme_is_an_error() {
        let factory = RegistryFactory::new();
        let err = match factory.open(&RegistrySource::from_url("https://plugins.example.com")) {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };
        assert!(matches!(err, RegistryError::UnsupportedScheme { .. }));
    }

    #[test]
    fn injected_builder_wins() {
        let factory = RegistryFactory::new().with_builder(
            "https",
            Arc::new(|_: &RegistrySource| Ok(Arc::new(StaticRegistry) as Arc<dyn Registry>)),
        );
        let registry = factory
            .open(&RegistrySource::from_url("https://plugins.example.com"))
            .unwrap();
        assert_eq!(registry.name(), "static");
    }
}
