use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading an [`EcsConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runtime policy switches for an entity set.
///
/// Missing fields in a config file fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    /// Reject reparent operations that would make an entity its own ancestor.
    /// When off, callers are responsible for never creating a cycle.
    pub cycle_check: bool,
    /// Register a component type on first typed use if it was never
    /// registered explicitly. Turn off to surface missing registrations.
    pub auto_register: bool,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            cycle_check: true,
            auto_register: true,
        }
    }
}

impl EcsConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
