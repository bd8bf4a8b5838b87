//! Shared identifiers and configuration for the scenekit workspace.

pub mod config;
pub mod types;

pub use config::{ConfigError, EcsConfig};
pub use types::{ComponentTypeId, EntityId};
