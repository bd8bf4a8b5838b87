//! The entity set: entity hierarchy, component tables, registry and the update
//! cache behind one API.
//!
//! Plain operations are fail-soft: unknown ids and missing components give a
//! no-op, `None` or an empty slice. The `try_*` forms report [`EcsError`].
//!
//! # Invariants
//! - `on_create` runs once per slot, on its first successful store.
//! - `on_destroy` runs once per stored slot, whether it is removed alone, with
//!   its entity, or when the set is cleared or dropped.
//! - The update cache holds exactly the stored slots that want updates, in
//!   first-store order.
//! - Every stored slot belongs to a live entity. An entity being removed
//!   accepts no new components or children while its hooks run.

use crate::component::{ComponentContext, ComponentHandle, ComponentRef, ComponentType};
use crate::entity::{Entity, EntityTable};
use crate::error::EcsError;
use crate::registry::ComponentRegistry;
use crate::storage::{ComponentTable, UpdateCache};
use scenekit_common::{ComponentTypeId, EcsConfig, EntityId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    Create,
    Update,
    Destroy,
}

/// Entities, their components, and the per-frame update cache.
#[derive(Debug)]
pub struct EntitySet {
    config: EcsConfig,
    entities: EntityTable,
    registry: ComponentRegistry,
    tables: BTreeMap<ComponentTypeId, ComponentTable>,
    update_cache: UpdateCache,
    dying: BTreeSet<EntityId>,
}

impl Default for EntitySet {
    fn default() -> Self {
        Self::new(ComponentRegistry::new())
    }
}

impl Drop for EntitySet {
    fn drop(&mut self) {
        self.clear();
    }
}

impl EntitySet {
    pub fn new(registry: ComponentRegistry) -> Self {
        Self::with_config(registry, EcsConfig::default())
    }

    pub fn with_config(registry: ComponentRegistry, config: EcsConfig) -> Self {
        Self {
            config,
            entities: EntityTable::new(),
            registry,
            tables: BTreeMap::new(),
            update_cache: UpdateCache::new(),
            dying: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &EcsConfig {
        &self.config
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Read-only view of the hierarchy.
    pub fn entity_table(&self) -> &EntityTable {
        &self.entities
    }

    // -- entities --

    pub fn create_entity(&mut self) -> EntityId {
        let id = self.entities.create();
        tracing::trace!(entity = %id, "created entity");
        id
    }

    pub fn create_named(&mut self, name: impl Into<String>) -> EntityId {
        let id = self.entities.create_named(name);
        tracing::trace!(entity = %id, name = self.entities.name(id), "created entity");
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Display name, empty for unknown ids.
    pub fn entity_name(&self, id: EntityId) -> &str {
        self.entities.name(id)
    }

    pub fn set_entity_name(&mut self, id: EntityId, name: impl Into<String>) -> bool {
        self.entities.set_name(id, name)
    }

    pub fn parent_of(&self, id: EntityId) -> Option<EntityId> {
        self.entities.parent(id)
    }

    pub fn children_of(&self, id: EntityId) -> &[EntityId] {
        self.entities.children(id)
    }

    pub fn parent_count(&self, id: EntityId) -> usize {
        self.entities.parent_count(id)
    }

    /// Create an entity under `parent`. `None` if `parent` is unknown or
    /// being removed.
    pub fn add_child(&mut self, parent: EntityId) -> Option<EntityId> {
        if !self.accepts(parent) {
            return None;
        }
        let child = self.entities.add_child(parent)?;
        tracing::trace!(entity = %child, parent = %parent, "created child entity");
        Some(child)
    }

    /// Move `id` under `new_parent` (`None` makes it a root).
    ///
    /// Fails with [`EcsError::HierarchyCycle`] when the move would make `id`
    /// its own ancestor and cycle checks are enabled. `Ok(false)` means there
    /// was nothing to do.
    pub fn try_reparent(
        &mut self,
        id: EntityId,
        new_parent: Option<EntityId>,
    ) -> Result<bool, EcsError> {
        let new_parent = new_parent.and_then(EntityId::valid);
        if !self.entities.contains(id) {
            return Err(EcsError::EntityNotFound(id));
        }
        if let Some(parent) = new_parent {
            if !self.accepts(parent) {
                return Err(EcsError::EntityNotFound(parent));
            }
            if self.config.cycle_check && self.entities.would_cycle(id, Some(parent)) {
                return Err(EcsError::HierarchyCycle { entity: id, parent });
            }
        }
        Ok(self.entities.reparent(id, new_parent))
    }

    /// Fail-soft [`EntitySet::try_reparent`]: `true` if the hierarchy changed.
    pub fn reparent(&mut self, id: EntityId, new_parent: Option<EntityId>) -> bool {
        match self.try_reparent(id, new_parent) {
            Ok(changed) => changed,
            Err(err @ EcsError::HierarchyCycle { .. }) => {
                tracing::warn!(%err, "reparent rejected");
                false
            }
            Err(err) => {
                tracing::debug!(%err, "reparent ignored");
                false
            }
        }
    }

    /// Remove an entity and all of its components.
    ///
    /// With `recursive` the whole subtree goes too; otherwise the direct
    /// children move up to the removed entity's parent (or become roots).
    pub fn remove_entity(&mut self, id: EntityId, recursive: bool) {
        if self.dying.contains(&id) {
            return;
        }
        let Some(entity) = self.entities.get(id) else {
            return;
        };
        let parent = entity.parent();
        let children = entity.children().to_vec();
        self.dying.insert(id);

        for child in children {
            if recursive {
                self.remove_entity(child, true);
            } else {
                self.entities.reparent(child, parent);
            }
        }

        let storages: Vec<ComponentTypeId> = self.tables.keys().copied().collect();
        for storage in storages {
            self.erase_all_components(storage, id);
        }

        self.dying.remove(&id);
        if self.entities.erase(id).is_some() {
            tracing::debug!(entity = %id, recursive, "removed entity");
        }
    }

    /// Remove every entity, running every component's destroy hook.
    pub fn clear(&mut self) {
        let roots: Vec<EntityId> = self.entities.roots().collect();
        for root in roots {
            self.remove_entity(root, true);
        }
    }

    // -- iteration --

    /// Pre-order walk from `start`, or every entity in id order for `None`.
    pub fn for_each_entity(&self, start: Option<EntityId>, f: impl FnMut(EntityId)) {
        self.entities.for_each(start, f);
    }

    pub fn for_each_root(&self, f: impl FnMut(EntityId)) {
        self.entities.roots().for_each(f);
    }

    pub fn for_each_sibling(&self, id: EntityId, f: impl FnMut(EntityId)) {
        self.entities.for_each_sibling(id, f);
    }

    /// Every slot in one storage table, grouped by entity.
    pub fn for_each_in_storage(&self, storage: ComponentTypeId, f: impl FnMut(&ComponentRef)) {
        if let Some(table) = self.tables.get(&storage) {
            table.iter().for_each(f);
        }
    }

    /// Every slot on `entity`, table by table.
    pub fn for_each_component_on_entity(
        &self,
        entity: EntityId,
        mut f: impl FnMut(&ComponentRef),
    ) {
        for table in self.tables.values() {
            table.all(entity).iter().for_each(&mut f);
        }
    }

    /// Every `T` in `T`'s storage.
    pub fn for_each_component<T: ComponentType>(&self, mut f: impl FnMut(ComponentHandle<T>)) {
        let Some(table) = self.table_of::<T>() else {
            return;
        };
        for slot in table.iter() {
            if let Some(handle) = slot.downcast::<T>() {
                f(handle);
            }
        }
    }

    // -- untyped components --

    /// Insert an instantiated slot into its table and run `on_create`.
    ///
    /// A slot that is already stored, was destroyed, or belongs to an unknown
    /// entity comes back untouched.
    pub fn store_component(&mut self, component: ComponentRef) -> ComponentRef {
        if component.is_destroyed() {
            return component;
        }
        let entity = component.entity();
        if !self.accepts(entity) {
            tracing::debug!(
                entity = %entity,
                component = component.type_name(),
                "store on unknown or dying entity ignored"
            );
            return component;
        }
        let table = self.tables.entry(component.storage_id()).or_default();
        if !table.add(&component) {
            return component;
        }
        component.mark_stored();
        self.run_hook(&component, Hook::Create);

        let wants_update = component
            .value
            .try_borrow()
            .is_ok_and(|value| value.wants_update());
        if component.is_stored() && wants_update {
            component.set_scheduled(true);
            self.update_cache.push(&component);
        }
        tracing::trace!(
            entity = %entity,
            component = component.type_name(),
            wants_update,
            "stored component"
        );
        component
    }

    /// Instantiate type `id` for `entity` and store it.
    pub fn create_component(
        &mut self,
        id: ComponentTypeId,
        entity: EntityId,
    ) -> Option<ComponentRef> {
        if !self.accepts(entity) {
            return None;
        }
        let component = self.registry.instantiate(id, entity)?;
        Some(self.store_component(component))
    }

    pub fn create_component_by_name(
        &mut self,
        name: &str,
        entity: EntityId,
    ) -> Option<ComponentRef> {
        let id = self.registry.id_of(name)?;
        self.create_component(id, entity)
    }

    /// Checked add used by tooling: the entity must exist, the name must be
    /// registered, and a unique type may not already be in its storage.
    pub fn try_add_component_by_name(
        &mut self,
        entity: EntityId,
        name: &str,
    ) -> Result<ComponentRef, EcsError> {
        if !self.accepts(entity) {
            return Err(EcsError::EntityNotFound(entity));
        }
        let info = self
            .registry
            .info_by_name(name)
            .ok_or_else(|| EcsError::UnknownComponent(name.to_owned()))?;
        let (id, storage) = (info.id(), info.storage());
        if info.is_unique() && self.has_component(storage, entity) {
            return Err(EcsError::DuplicateUnique {
                component: name.to_owned(),
                entity,
            });
        }
        self.create_component(id, entity)
            .ok_or_else(|| EcsError::UnknownComponent(name.to_owned()))
    }

    /// Primary (index 0) component of a storage type.
    pub fn find_component(
        &self,
        storage: ComponentTypeId,
        entity: EntityId,
    ) -> Option<ComponentRef> {
        self.tables.get(&storage)?.first(entity).cloned()
    }

    pub fn find_components(&self, storage: ComponentTypeId, entity: EntityId) -> &[ComponentRef] {
        self.tables.get(&storage).map_or(&[], |table| table.all(entity))
    }

    pub fn has_component(&self, storage: ComponentTypeId, entity: EntityId) -> bool {
        self.tables.get(&storage).is_some_and(|table| table.contains(entity))
    }

    /// Destroy every component of one storage type on `entity`.
    pub fn erase_all_components(&mut self, storage: ComponentTypeId, entity: EntityId) {
        let Some(table) = self.tables.get_mut(&storage) else {
            return;
        };
        for component in table.take(entity) {
            self.teardown(&component);
        }
    }

    /// Destroy one component. No-op if it is not stored.
    pub fn erase_component(&mut self, component: &ComponentRef) {
        let Some(table) = self.tables.get_mut(&component.storage_id()) else {
            return;
        };
        if table.remove(component) {
            self.teardown(component);
        }
    }

    /// Stored components across all tables.
    pub fn component_count(&self) -> usize {
        self.tables.values().map(ComponentTable::len).sum()
    }

    /// Components currently scheduled for updates.
    pub fn scheduled_count(&self) -> usize {
        self.update_cache.len()
    }

    /// Slots in the update cache, in update order.
    pub fn scheduled(&self) -> impl Iterator<Item = &ComponentRef> + '_ {
        self.update_cache.iter()
    }

    // -- typed components --

    /// Create a `T` on `entity`, registering `T` first if allowed.
    pub fn add<T: ComponentType>(&mut self, entity: EntityId) -> Option<ComponentHandle<T>> {
        if !self.accepts(entity) {
            tracing::debug!(
                entity = %entity,
                component = T::NAME,
                "add on unknown or dying entity ignored"
            );
            return None;
        }
        let component = self
            .registry
            .instantiate_typed::<T>(entity, self.config.auto_register)?;
        if !component.is::<T>() {
            tracing::warn!(component = T::NAME, "registered factory builds a different type");
            return None;
        }
        ComponentHandle::new(self.store_component(component))
    }

    /// Create a fresh entity carrying a `T`.
    pub fn spawn<T: ComponentType>(&mut self) -> Option<ComponentHandle<T>> {
        let entity = self.create_entity();
        let handle = self.add::<T>(entity);
        if handle.is_none() {
            self.remove_entity(entity, false);
        }
        handle
    }

    /// First `T` on `entity`.
    pub fn get<T: ComponentType>(&self, entity: EntityId) -> Option<ComponentHandle<T>> {
        self.table_of::<T>()?
            .all(entity)
            .iter()
            .find_map(|slot| slot.downcast::<T>())
    }

    pub fn get_all<T: ComponentType>(&self, entity: EntityId) -> Vec<ComponentHandle<T>> {
        self.table_of::<T>().map_or_else(Vec::new, |table| {
            table
                .all(entity)
                .iter()
                .filter_map(|slot| slot.downcast::<T>())
                .collect()
        })
    }

    pub fn has<T: ComponentType>(&self, entity: EntityId) -> bool {
        self.get::<T>(entity).is_some()
    }

    /// First `T` on `entity`, adding one if there is none.
    pub fn must_get<T: ComponentType>(&mut self, entity: EntityId) -> Option<ComponentHandle<T>> {
        match self.get::<T>(entity) {
            Some(handle) => Some(handle),
            None => self.add::<T>(entity),
        }
    }

    /// Destroy every `T` on `entity`. Other types sharing the storage stay.
    pub fn remove<T: ComponentType>(&mut self, entity: EntityId) {
        let doomed: Vec<ComponentRef> = self
            .get_all::<T>(entity)
            .into_iter()
            .map(ComponentHandle::into_slot)
            .collect();
        for component in doomed {
            self.erase_component(&component);
        }
    }

    pub fn remove_component<T: ComponentType>(&mut self, handle: &ComponentHandle<T>) {
        self.erase_component(handle.slot());
    }

    // -- frame --

    /// Run `on_update` once on every stored, active, update-wanting component,
    /// in cache order. Returns how many hooks ran.
    pub fn update(&mut self) -> usize {
        let _span = tracing::trace_span!("entity_set_update").entered();
        let mut updated = 0;
        for component in self.update_cache.snapshot() {
            if !component.is_stored() || !component.is_active() {
                continue;
            }
            if self.run_hook(&component, Hook::Update) {
                updated += 1;
            }
        }
        tracing::trace!(updated, scheduled = self.update_cache.len(), "update pass done");
        updated
    }

    /// Live and not in the middle of being removed.
    fn accepts(&self, entity: EntityId) -> bool {
        self.entities.contains(entity) && !self.dying.contains(&entity)
    }

    fn table_of<T: ComponentType>(&self) -> Option<&ComponentTable> {
        let storage = self.registry.storage_id_of::<T>()?;
        self.tables.get(&storage)
    }

    /// Unschedule and destroy a slot already taken out of its table.
    fn teardown(&mut self, component: &ComponentRef) {
        if component.is_scheduled() {
            self.update_cache.remove(component);
            component.set_scheduled(false);
        }
        component.mark_destroyed();
        tracing::trace!(
            entity = %component.entity(),
            component = component.type_name(),
            "destroying component"
        );
        self.run_hook(component, Hook::Destroy);
    }

    /// Run one hook with a context over `self`. Returns `false` if the
    /// component was busy.
    fn run_hook(&mut self, component: &ComponentRef, hook: Hook) -> bool {
        let Ok(mut value) = component.value.try_borrow_mut() else {
            if hook == Hook::Destroy && component.in_hook() {
                // Finished by the outer call once the running hook returns.
                component.defer_destroy();
            } else {
                tracing::warn!(
                    entity = %component.entity(),
                    component = component.type_name(),
                    ?hook,
                    "component busy, hook skipped"
                );
            }
            return false;
        };

        let nested = component.in_hook();
        component.set_in_hook(true);
        let mut ctx = ComponentContext::new(component, self);
        match hook {
            Hook::Create => value.on_create(&mut ctx),
            Hook::Update => value.on_update(&mut ctx),
            Hook::Destroy => value.on_destroy(&mut ctx),
        }
        drop(value);
        component.set_in_hook(nested);

        if hook != Hook::Destroy && component.take_deferred_destroy() {
            self.run_hook(component, Hook::Destroy);
        }
        true
    }
}
