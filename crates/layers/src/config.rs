use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::registry::{LayerParams, LayerRegistry, RegistryError};

/// Scene description: the layers to add, in order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub layers: Vec<LayerParams>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Registry(RegistryError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "scene config io error: {msg}"),
            ConfigError::Parse(msg) => write!(f, "scene config parse error: {msg}"),
            ConfigError::Registry(e) => write!(f, "scene config rejected: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<RegistryError> for ConfigError {
    fn from(e: RegistryError) -> Self {
        ConfigError::Registry(e)
    }
}

impl SceneConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Io(format!("{path:?}: {e}")))?;
        Self::from_json_str(&raw)
    }

    /// Adds every layer to a fresh registry, stopping at the first rejected one.
    pub fn build_registry(&self) -> Result<LayerRegistry, ConfigError> {
        let mut registry = LayerRegistry::new();
        for params in &self.layers {
            registry.add_layer(params)?;
        }
        Ok(registry)
    }
}
