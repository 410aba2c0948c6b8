use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of the lock file.
pub const LOCKFILE_NAME: &str = "satchel.lock";

/// Deterministic lock file recording exact resolved plugin versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub plugin: Vec<LockedPlugin>,
}

/// A single locked plugin with its resolved source and declared dependencies.
///
/// `dependencies` maps each dependency name to the constraint this plugin
/// declares on it, as recorded the last time the plugin was fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockedPlugin {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub resolved: Option<String>,
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl Lockfile {
    /// Load and parse a `satchel.lock` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            satchel_util::errors::SatchelError::Lockfile {
                message: format!("Failed to read lock file: {e}"),
            }
        })?;
        let lockfile: Self = toml::from_str(&content).map_err(|e| {
            satchel_util::errors::SatchelError::Lockfile {
                message: format!("Failed to parse lock file: {e}"),
            }
        })?;
        tracing::debug!(plugins = lockfile.plugin.len(), "loaded lock file");
        Ok(lockfile)
    }

    /// Serialize the lock file to a pretty-printed TOML string.
    pub fn to_string_pretty(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Look up a locked plugin by name.
    pub fn get(&self, name: &str) -> Option<&LockedPlugin> {
        self.plugin.iter().find(|p| p.name == name)
    }

    /// All locked plugin names, sorted.
    pub fn plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.plugin.iter().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.plugin.is_empty()
    }
}
