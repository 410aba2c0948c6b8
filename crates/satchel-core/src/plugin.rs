use serde::{Deserialize, Serialize};

/// A plugin entry in `satchel.toml`.
///
/// Supports both shorthand (`my-plugin = "^1.0"`) and detailed forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginEntry {
    Version(String),
    Detailed(DetailedPlugin),
}

/// A plugin entry with explicit version, source, and registry fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailedPlugin {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub registry: Option<String>,
}

impl PluginEntry {
    /// The declared version constraint, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Version(v) => Some(v),
            Self::Detailed(d) => d.version.as_deref(),
        }
    }

    /// The declared source URL, if any.
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Version(_) => None,
            Self::Detailed(d) => d.source.as_deref(),
        }
    }

    /// The declared registry name, if any.
    pub fn registry(&self) -> Option<&str> {
        match self {
            Self::Version(_) => None,
            Self::Detailed(d) => d.registry.as_deref(),
        }
    }
}

/// An install request: a plugin name plus optional explicit overrides.
///
/// Any field present here wins over the project-config default for the
/// same plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginSpec {
    pub name: String,
    pub version: Option<String>,
    pub source: Option<String>,
    pub registry: Option<String>,
}

impl PluginSpec {
    /// A bare request for `name` with no overrides.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A request pinned to an explicit version.
    pub fn with_version(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: Some(version.into()),
            ..Self::default()
        }
    }
}

impl std::fmt::Display for PluginSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(v) => write!(f, "{}@{v}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
