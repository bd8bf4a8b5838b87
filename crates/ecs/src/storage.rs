//! Per-type component tables and the flat update cache.
//!
//! These are plain containers: they never run hooks. The entity set decides
//! when hooks fire around insertions and removals.
//!
//! # Invariants
//! - A slot appears at most once in its table (pointer identity).
//! - Index 0 of an entity's list is its primary component of that type.
//! - The update cache is in first-successful-store order.

use crate::component::ComponentRef;
use scenekit_common::EntityId;
use std::collections::BTreeMap;
use std::rc::Rc;

/// All components of one storage type, keyed by owning entity.
#[derive(Debug, Default)]
pub struct ComponentTable {
    entities: BTreeMap<EntityId, Vec<ComponentRef>>,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `component` to its entity's list. Returns `false` if that exact
    /// slot is already present.
    pub fn add(&mut self, component: &ComponentRef) -> bool {
        let list = self.entities.entry(component.entity()).or_default();
        if list.iter().any(|c| Rc::ptr_eq(c, component)) {
            return false;
        }
        list.push(Rc::clone(component));
        true
    }

    /// Remove one slot. Returns `false` if it was not in the table.
    pub fn remove(&mut self, component: &ComponentRef) -> bool {
        let entity = component.entity();
        let Some(list) = self.entities.get_mut(&entity) else {
            return false;
        };
        let Some(index) = list.iter().position(|c| Rc::ptr_eq(c, component)) else {
            return false;
        };
        list.remove(index);
        if list.is_empty() {
            self.entities.remove(&entity);
        }
        true
    }

    /// Detach and return every slot of `entity`, in insertion order.
    pub fn take(&mut self, entity: EntityId) -> Vec<ComponentRef> {
        self.entities.remove(&entity).unwrap_or_default()
    }

    pub fn first(&self, entity: EntityId) -> Option<&ComponentRef> {
        self.entities.get(&entity).and_then(|list| list.first())
    }

    pub fn all(&self, entity: EntityId) -> &[ComponentRef] {
        self.entities.get(&entity).map_or(&[], |list| list.as_slice())
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.get(&entity).is_some_and(|list| !list.is_empty())
    }

    /// Every slot, grouped by entity in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentRef> + '_ {
        self.entities.values().flatten()
    }

    /// Total number of slots across all entities.
    pub fn len(&self) -> usize {
        self.entities.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Flat list of components that receive per-frame updates.
#[derive(Debug, Default)]
pub struct UpdateCache {
    entries: Vec<ComponentRef>,
}

impl UpdateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, component: &ComponentRef) {
        self.entries.push(Rc::clone(component));
    }

    pub fn remove(&mut self, component: &ComponentRef) -> bool {
        match self.entries.iter().position(|c| Rc::ptr_eq(c, component)) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Copy of the current order, for walking while the cache may change.
    pub fn snapshot(&self) -> Vec<ComponentRef> {
        self.entries.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentRef> + '_ {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentSlot};
    use scenekit_common::ComponentTypeId;

    struct Marker;
    impl Component for Marker {}

    fn slot(entity: u64) -> ComponentRef {
        ComponentSlot::new(
            EntityId(entity),
            ComponentTypeId(0),
            ComponentTypeId(0),
            Rc::from("Marker"),
            Box::new(Marker),
        )
    }

    #[test]
    fn add_rejects_same_slot() {
        let mut table = ComponentTable::new();
        let a = slot(1);
        assert!(table.add(&a));
        assert!(!table.add(&a));
        assert_eq!(table.all(EntityId(1)).len(), 1);
    }

    #[test]
    fn distinct_slots_keep_insertion_order() {
        let mut table = ComponentTable::new();
        let a = slot(1);
        let b = slot(1);
        table.add(&a);
        table.add(&b);
        assert!(Rc::ptr_eq(table.first(EntityId(1)).unwrap(), &a));
        assert_eq!(table.len(), 2);

        table.remove(&a);
        assert!(Rc::ptr_eq(table.first(EntityId(1)).unwrap(), &b));
    }

    #[test]
    fn removing_last_clears_entity() {
        let mut table = ComponentTable::new();
        let a = slot(2);
        table.add(&a);
        assert!(table.contains(EntityId(2)));
        assert!(table.remove(&a));
        assert!(!table.contains(EntityId(2)));
        assert!(table.is_empty());
        assert!(!table.remove(&a));
    }

    #[test]
    fn take_detaches_all() {
        let mut table = ComponentTable::new();
        table.add(&slot(3));
        table.add(&slot(3));
        table.add(&slot(4));
        assert_eq!(table.take(EntityId(3)).len(), 2);
        assert!(table.all(EntityId(3)).is_empty());
        assert_eq!(table.len(), 1);
        assert!(table.take(EntityId(9)).is_empty());
    }

    #[test]
    fn update_cache_order_and_removal() {
        let mut cache = UpdateCache::new();
        let (a, b, c) = (slot(1), slot(2), slot(3));
        cache.push(&a);
        cache.push(&b);
        cache.push(&c);
        assert!(cache.remove(&b));
        assert!(!cache.remove(&b));
        cache.push(&b);
        let order: Vec<_> = cache.iter().map(|s| s.entity()).collect();
        assert_eq!(order, vec![EntityId(1), EntityId(3), EntityId(2)]);
        assert_eq!(cache.snapshot().len(), 3);
    }
}
