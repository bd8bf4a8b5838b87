//! Entity identity and the parent/child hierarchy.
//!
//! # Invariants
//! - If A lists B as a child, B's parent is A, and B appears in that list once.
//! - An entity with no parent is in the root set; an entity with a parent is not.
//! - `create` never hands out an id that is currently live.

use scenekit_common::EntityId;
use std::collections::{BTreeMap, BTreeSet};

/// A bare handle with a name and a place in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    name: String,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
}

impl Entity {
    fn new(id: EntityId) -> Self {
        Self {
            id,
            name: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    pub fn children(&self) -> &[EntityId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Owns every entity record plus the root set.
///
/// Component storage lives elsewhere; full entity removal (which also tears
/// down components) is driven by the entity set on top of [`EntityTable::erase`].
#[derive(Debug, Clone, Default)]
pub struct EntityTable {
    entities: BTreeMap<EntityId, Entity>,
    roots: BTreeSet<EntityId>,
    next: u64,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// All live ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Root ids in ascending order.
    pub fn roots(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.roots.iter().copied()
    }

    /// Allocate a new root entity.
    ///
    /// Probes forward from the internal counter past any live id, so an id is
    /// only handed out again once its slot has been vacated.
    pub fn create(&mut self) -> EntityId {
        loop {
            let candidate = EntityId(self.next);
            self.next = self.next.wrapping_add(1);
            if candidate.is_valid() && !self.entities.contains_key(&candidate) {
                self.entities.insert(candidate, Entity::new(candidate));
                self.roots.insert(candidate);
                return candidate;
            }
        }
    }

    pub fn create_named(&mut self, name: impl Into<String>) -> EntityId {
        let id = self.create();
        self.set_name(id, name);
        id
    }

    /// Display name of an entity, empty for unknown ids.
    pub fn name(&self, id: EntityId) -> &str {
        self.entities.get(&id).map_or("", |e| e.name.as_str())
    }

    pub fn set_name(&mut self, id: EntityId, name: impl Into<String>) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn parent(&self, id: EntityId) -> Option<EntityId> {
        self.entities.get(&id).and_then(|e| e.parent)
    }

    /// Children of an entity, empty for unknown ids.
    pub fn children(&self, id: EntityId) -> &[EntityId] {
        self.entities.get(&id).map_or(&[], |e| e.children.as_slice())
    }

    /// Create a new entity directly under `parent`.
    pub fn add_child(&mut self, parent: EntityId) -> Option<EntityId> {
        if !self.contains(parent) {
            return None;
        }
        let child = self.create();
        self.reparent(child, Some(parent));
        Some(child)
    }

    /// Move `id` under `new_parent` (`None` makes it a root).
    ///
    /// Returns `false` without touching anything when `id` or `new_parent` is
    /// unknown, or when `new_parent` already is the parent. Does not look for
    /// cycles; see [`EntityTable::would_cycle`].
    pub fn reparent(&mut self, id: EntityId, new_parent: Option<EntityId>) -> bool {
        let new_parent = new_parent.and_then(EntityId::valid);
        let Some(entity) = self.entities.get(&id) else {
            return false;
        };
        if entity.parent == new_parent {
            return false;
        }
        if let Some(parent) = new_parent {
            if !self.entities.contains_key(&parent) {
                return false;
            }
        }

        self.detach(id);
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.parent = new_parent;
        }
        match new_parent {
            Some(parent) => {
                if let Some(parent) = self.entities.get_mut(&parent) {
                    parent.children.push(id);
                }
            }
            None => {
                self.roots.insert(id);
            }
        }
        true
    }

    /// Whether placing `id` under `new_parent` would make `id` its own ancestor.
    pub fn would_cycle(&self, id: EntityId, new_parent: Option<EntityId>) -> bool {
        let mut cursor = new_parent.and_then(EntityId::valid);
        let mut steps = 0;
        while let Some(current) = cursor {
            if current == id {
                return true;
            }
            // An existing cycle must not hang the walk.
            steps += 1;
            if steps > self.entities.len() {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Remove the record for `id`, unlinking it from its parent or the root set.
    ///
    /// Children still attached are promoted to roots so no child is left
    /// pointing at a missing parent. Callers that want other child handling
    /// must deal with the children first.
    pub fn erase(&mut self, id: EntityId) -> Option<Entity> {
        if !self.entities.contains_key(&id) {
            return None;
        }
        self.detach(id);
        let entity = self.entities.remove(&id)?;
        for child in &entity.children {
            if let Some(orphan) = self.entities.get_mut(child) {
                orphan.parent = None;
                self.roots.insert(*child);
            }
        }
        Some(entity)
    }

    /// Number of ancestors between `id` and its root.
    pub fn parent_count(&self, id: EntityId) -> usize {
        let mut count = 0;
        let mut cursor = self.parent(id);
        while let Some(parent) = cursor {
            count += 1;
            if count > self.entities.len() {
                break;
            }
            cursor = self.parent(parent);
        }
        count
    }

    /// Pre-order depth-first walk from `start`, or every entity in id order
    /// when `start` is `None`. Unknown `start` visits nothing.
    pub fn for_each(&self, start: Option<EntityId>, mut f: impl FnMut(EntityId)) {
        let Some(start) = start.and_then(EntityId::valid) else {
            self.entities.keys().for_each(|id| f(*id));
            return;
        };
        if !self.contains(start) {
            return;
        }
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            f(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
    }

    /// Other entities sharing `id`'s parent, or the other roots when `id` is a root.
    pub fn for_each_sibling(&self, id: EntityId, mut f: impl FnMut(EntityId)) {
        let Some(entity) = self.entities.get(&id) else {
            return;
        };
        match entity.parent {
            Some(parent) => self
                .children(parent)
                .iter()
                .copied()
                .filter(|sibling| *sibling != id)
                .for_each(&mut f),
            None => self
                .roots
                .iter()
                .copied()
                .filter(|sibling| *sibling != id)
                .for_each(&mut f),
        }
    }

    fn detach(&mut self, id: EntityId) {
        match self.parent(id) {
            Some(parent) => {
                if let Some(parent) = self.entities.get_mut(&parent) {
                    parent.children.retain(|child| *child != id);
                }
            }
            None => {
                self.roots.remove(&id);
            }
        }
    }

    /// Check the bidirectional parent/child invariant. Test support.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for (id, entity) in &self.entities {
            match entity.parent {
                Some(parent) => {
                    let parent = self.entities.get(&parent).expect("parent is live");
                    let hits = parent.children.iter().filter(|c| *c == id).count();
                    assert_eq!(hits, 1, "{id} listed {hits} times by its parent");
                    assert!(!self.roots.contains(id), "{id} has a parent but is a root");
                }
                None => assert!(self.roots.contains(id), "{id} is parentless but not a root"),
            }
            for child in &entity.children {
                let child = self.entities.get(child).expect("child is live");
                assert_eq!(child.parent, Some(*id));
            }
        }
        for root in &self.roots {
            assert!(self.entities.contains_key(root), "dangling root {root}");
        }
    }
}
