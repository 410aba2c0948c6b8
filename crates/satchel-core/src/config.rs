use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::plugin::{PluginEntry, PluginSpec};

/// File name of the project configuration.
pub const CONFIG_FILE_NAME: &str = "satchel.toml";

/// The parsed representation of a `satchel.toml` file.
///
/// Declared plugins and registries are used only as fallback defaults
/// during resolution; an explicit [`PluginSpec`] field always wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub plugins: BTreeMap<String, PluginEntry>,

    #[serde(default)]
    pub registries: BTreeMap<String, RegistryEntry>,
}

/// A registry reference, either a path/URL string or a detailed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryEntry {
    Url(String),
    Detailed {
        url: String,
        #[serde(default)]
        token: Option<String>,
    },
}

impl RegistryEntry {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Detailed { url, .. } => url,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Url(_) => None,
            Self::Detailed { token, .. } => token.as_deref(),
        }
    }
}

impl ProjectConfig {
    /// Load and parse a `satchel.toml` file from the given path.
    pub fn from_path(path: &Path) -> miette::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            satchel_util::errors::SatchelError::Config {
                message: format!("Failed to read {}: {e}", path.display()),
            }
        })?;
        Self::from_str(&content)
    }

    /// Parse a `satchel.toml` from a string.
    pub fn from_str(content: &str) -> miette::Result<Self> {
        toml::from_str(content).map_err(|e| {
            satchel_util::errors::SatchelError::Config {
                message: format!("Failed to parse satchel.toml: {e}"),
            }
            .into()
        })
    }

    /// Build an install request for `name` from its declared entry.
    ///
    /// Undeclared names yield a bare spec; resolution will fail later unless
    /// the lock file or an explicit override supplies the missing pieces.
    pub fn spec_for(&self, name: &str) -> PluginSpec {
        match self.plugins.get(name) {
            Some(entry) => PluginSpec {
                name: name.to_string(),
                version: entry.version().map(str::to_string),
                source: entry.source().map(str::to_string),
                registry: entry.registry().map(str::to_string),
            },
            None => PluginSpec::new(name),
        }
    }

    /// Install requests for every declared plugin, in name order.
    pub fn specs(&self) -> Vec<PluginSpec> {
        self.plugins.keys().map(|name| self.spec_for(name)).collect()
    }

    /// Look up a declared registry by name.
    pub fn registry(&self, name: &str) -> Option<&RegistryEntry> {
        self.registries.get(name)
    }
}

/// Walk up from `start` to find the directory containing `satchel.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    satchel_util::fs::find_ancestor_with(start, CONFIG_FILE_NAME)
}
