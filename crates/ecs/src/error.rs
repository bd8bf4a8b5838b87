use scenekit_common::EntityId;

/// Errors from the checked entity-set operations.
///
/// The plain operations stay fail-soft (no-op, `None`, or empty); these
/// variants are what the `try_*` forms report instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),
    #[error("component type '{0}' is not registered")]
    UnknownComponent(String),
    #[error("component '{component}' is unique and already present on entity {entity}")]
    DuplicateUnique { component: String, entity: EntityId },
    #[error("moving entity {entity} under {parent} would make it its own ancestor")]
    HierarchyCycle { entity: EntityId, parent: EntityId },
}
