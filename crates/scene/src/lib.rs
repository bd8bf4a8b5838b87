//! Scenes: an entity set, the lazily built systems that work on it, and the
//! stock components, systems and setup routines used by the editor and CLI.
//!
//! # Invariants
//! - A scene owns its systems; there is no process-wide system state.
//! - Stock components are registered before any scene entity is created.

pub mod components;
pub mod scene;
pub mod setup;
pub mod system;
pub mod systems;

pub use components::{
    register_stock_components, AutoMover, Camera, DrawShape, EditorHidden, Light, LightKind,
    Model, Shape, Transform, DRAWABLE_STORAGE,
};
pub use scene::Scene;
pub use setup::{DefaultEntities, EditorEntities};
pub use system::{System, SystemSet, SystemType};
pub use systems::{DrawItem, DrawKind, DrawListSystem, LightInfo, LightingSystem, MAX_LIGHTS};
