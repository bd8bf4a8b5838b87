//! Entity-component runtime: the entity hierarchy, a component registry,
//! per-type component storage and the [`EntitySet`] that ties them together.
//!
//! Components are trait objects in shared slots, so hooks can reach back into
//! the owning set while they run. Everything is single-threaded.
//!
//! # Invariants
//! - Parent and child links always agree; parentless entities are roots.
//! - Entity ids are never handed out while live.
//! - Iteration over entities and tables is in id order (BTreeMap).

pub mod component;
pub mod entity;
pub mod entity_set;
pub mod error;
pub mod registry;
pub mod storage;

pub use component::{
    AsAny, Component, ComponentContext, ComponentHandle, ComponentRef, ComponentSlot,
    ComponentType,
};
pub use entity::{Entity, EntityTable};
pub use entity_set::EntitySet;
pub use error::EcsError;
pub use registry::{ComponentFactory, ComponentInfo, ComponentRegistry};
pub use storage::{ComponentTable, UpdateCache};
