use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an entity in an entity set.
///
/// Ids are allocated monotonically and never reused while the entity is live.
/// The all-ones value is reserved as the "no entity" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// The reserved "no entity" value.
    pub const INVALID: EntityId = EntityId(u64::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Map the sentinel to `None`.
    pub fn valid(self) -> Option<EntityId> {
        self.is_valid().then_some(self)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#none")
        }
    }
}

/// Registry-assigned identifier of a component type.
///
/// Assigned in registration order by a component registry; only meaningful
/// within the process (and registry) that assigned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentTypeId(pub u32);

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_is_all_ones() {
        assert_eq!(EntityId::INVALID.0, u64::MAX);
        assert!(!EntityId::INVALID.is_valid());
        assert_eq!(EntityId::INVALID.valid(), None);
        assert_eq!(EntityId::default(), EntityId::INVALID);
    }

    #[test]
    fn valid_ids_map_to_some() {
        let id = EntityId(7);
        assert!(id.is_valid());
        assert_eq!(id.valid(), Some(id));
    }

    #[test]
    fn display_formats() {
        assert_eq!(EntityId(3).to_string(), "#3");
        assert_eq!(EntityId::INVALID.to_string(), "#none");
        assert_eq!(ComponentTypeId(2).to_string(), "component:2");
    }
}
