//! Local directory registry: a filesystem tree of published plugin versions.
//!
//! Layout: `<root>/<plugin-name>/<version>/` where each version directory
//! holds the plugin's resource bundle. Only directory names that parse as
//! semver versions count as published versions.

use std::path::{Path, PathBuf};

use crate::{Registry, RegistryError, ResolvedVersion};

/// A registry backed by a local directory tree.
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    name: String,
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Published version directory names for `plugin`, unsorted.
    fn published_versions(&self, plugin: &str) -> Result<Vec<String>, RegistryError> {
        let dir = self.root.join(plugin);
        if !dir.is_dir() {
            return Err(RegistryError::PackageNotFound {
                package: plugin.to_string(),
                registry: Some(self.name.clone()),
            });
        }
        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if satchel_core::version::parse(name).is_ok() {
                versions.push(name.to_string());
            }
        }
        Ok(versions)
    }

    fn version_dir(&self, plugin: &str, version: &str) -> PathBuf {
        self.root.join(plugin).join(version)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Registry for LocalRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve(&self, name: &str, constraint: &str) -> Result<ResolvedVersion, RegistryError> {
        let versions = self.published_versions(name)?;
        tracing::debug!(
            registry = %self.name,
            plugin = name,
            candidates = versions.len(),
            "listing published versions"
        );
        match satchel_core::version::best_match(constraint, versions.iter().map(String::as_str)) {
            Some(version) => Ok(ResolvedVersion {
                version: version.to_string(),
                url: self.version_dir(name, version).display().to_string(),
            }),
            None => {
                let mut available = versions;
                available.sort();
                Err(RegistryError::VersionNotFound {
                    package: name.to_string(),
                    constraint: constraint.to_string(),
                    available,
                })
            }
        }
    }
}
