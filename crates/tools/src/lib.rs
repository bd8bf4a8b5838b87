//! Developer tooling: scene inspector, outline, component picker and entity
//! selection. Everything here is UI-free so editors and the CLI share it.
//!
//! # Invariants
//! - Tools only read the scene, except through explicit selection state.

pub mod inspector;
pub mod selection;

pub use inspector::{
    display_name, ComponentRow, EntityInfo, OutlineRow, SceneInspector, SceneSummary,
};
pub use selection::EntitySelection;
