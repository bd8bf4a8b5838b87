//! The component contract, the shared slot each stored component lives in,
//! and typed handles over slots.
//!
//! A component is a boxed [`Component`] trait object inside a reference-counted
//! [`ComponentSlot`]. The slot carries everything the entity set needs without
//! borrowing the component itself: owning entity, storage and display type ids,
//! the active flag, and lifecycle state.

use crate::entity_set::EntitySet;
use scenekit_common::{ComponentTypeId, EntityId};
use std::any::{Any, TypeId};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Downcasting support for trait objects. Implemented for every `'static` type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-frame data and behaviour attached to exactly one entity.
///
/// Every hook gets a [`ComponentContext`] with the owning entity and mutable
/// access to the entity set, so hooks may add or remove other components and
/// entities. While a hook runs the component itself is mutably borrowed;
/// fetching a handle to the same component and borrowing it from inside its
/// own hook panics.
pub trait Component: AsAny {
    /// Whether the component wants [`Component::on_update`] every frame.
    /// Read once, right after [`Component::on_create`].
    fn wants_update(&self) -> bool {
        false
    }

    /// Runs once, when the component is first stored.
    fn on_create(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Runs once per frame while the component is stored, active and wants updates.
    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Runs once, before the component is dropped.
    fn on_destroy(&mut self, _ctx: &mut ComponentContext<'_>) {}
}

/// A component type usable through the typed entity-set API.
///
/// `STORAGE` names the table instances live in. A derived type sets it to its
/// base type's `NAME` so both share one table while reporting different names.
pub trait ComponentType: Component + Default {
    const NAME: &'static str;
    const STORAGE: &'static str = Self::NAME;
    /// Only one instance per entity is allowed through the checked API.
    const UNIQUE: bool = false;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Detached,
    Stored,
    Destroyed,
}

/// Shared home of one component instance.
pub struct ComponentSlot {
    entity: EntityId,
    type_id: ComponentTypeId,
    storage_id: ComponentTypeId,
    type_name: Rc<str>,
    concrete: TypeId,
    active: Cell<bool>,
    state: Cell<SlotState>,
    scheduled: Cell<bool>,
    in_hook: Cell<bool>,
    destroy_pending: Cell<bool>,
    pub(crate) value: RefCell<Box<dyn Component>>,
}

/// Shared reference to a stored component. Identity is pointer identity.
pub type ComponentRef = Rc<ComponentSlot>;

impl ComponentSlot {
    pub fn new(
        entity: EntityId,
        type_id: ComponentTypeId,
        storage_id: ComponentTypeId,
        type_name: Rc<str>,
        value: Box<dyn Component>,
    ) -> ComponentRef {
        let concrete = (*value).as_any().type_id();
        Rc::new(Self {
            entity,
            type_id,
            storage_id,
            type_name,
            concrete,
            active: Cell::new(true),
            state: Cell::new(SlotState::Detached),
            scheduled: Cell::new(false),
            in_hook: Cell::new(false),
            destroy_pending: Cell::new(false),
            value: RefCell::new(value),
        })
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Display identity (what inspectors show).
    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    /// Which per-type table the component lives in.
    pub fn storage_id(&self) -> ComponentTypeId {
        self.storage_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Inactive components stay stored but are skipped by the update pass.
    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    pub fn is_stored(&self) -> bool {
        self.state.get() == SlotState::Stored
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.get() == SlotState::Destroyed
    }

    /// Whether the slot sits in the update cache.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled.get()
    }

    /// Whether the boxed value is a `T`.
    pub fn is<T: Component>(&self) -> bool {
        self.concrete == TypeId::of::<T>()
    }

    /// Borrow the component as a trait object.
    pub fn borrow(&self) -> Ref<'_, dyn Component> {
        Ref::map(self.value.borrow(), |value| &**value)
    }

    pub fn downcast<T: Component>(self: &Rc<Self>) -> Option<ComponentHandle<T>> {
        ComponentHandle::new(Rc::clone(self))
    }

    pub(crate) fn mark_stored(&self) {
        self.state.set(SlotState::Stored);
    }

    pub(crate) fn mark_destroyed(&self) {
        self.state.set(SlotState::Destroyed);
    }

    pub(crate) fn set_scheduled(&self, scheduled: bool) {
        self.scheduled.set(scheduled);
    }

    pub(crate) fn in_hook(&self) -> bool {
        self.in_hook.get()
    }

    pub(crate) fn set_in_hook(&self, in_hook: bool) {
        self.in_hook.set(in_hook);
    }

    pub(crate) fn defer_destroy(&self) {
        self.destroy_pending.set(true);
    }

    pub(crate) fn take_deferred_destroy(&self) -> bool {
        self.destroy_pending.replace(false)
    }
}

impl fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("entity", &self.entity)
            .field("type_name", &self.type_name)
            .field("storage_id", &self.storage_id)
            .field("active", &self.active.get())
            .field("state", &self.state.get())
            .finish()
    }
}

fn cast_ref<T: Component>(value: &dyn Component) -> &T {
    value
        .as_any()
        .downcast_ref::<T>()
        .expect("handle type is checked on construction")
}

fn cast_mut<T: Component>(value: &mut dyn Component) -> &mut T {
    value
        .as_any_mut()
        .downcast_mut::<T>()
        .expect("handle type is checked on construction")
}

/// Typed view of a slot whose component is known to be a `T`.
pub struct ComponentHandle<T> {
    slot: ComponentRef,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> ComponentHandle<T> {
    /// Wrap `slot` if it holds a `T`.
    pub fn new(slot: ComponentRef) -> Option<Self> {
        slot.is::<T>().then(|| Self {
            slot,
            _marker: PhantomData,
        })
    }

    pub fn slot(&self) -> &ComponentRef {
        &self.slot
    }

    pub fn into_slot(self) -> ComponentRef {
        self.slot
    }

    pub fn entity(&self) -> EntityId {
        self.slot.entity()
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_active()
    }

    pub fn set_active(&self, active: bool) {
        self.slot.set_active(active);
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        Ref::map(self.slot.value.borrow(), |value| cast_ref::<T>(&**value))
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        RefMut::map(self.slot.value.borrow_mut(), |value| {
            cast_mut::<T>(&mut **value)
        })
    }

    /// `None` while the component is borrowed elsewhere (e.g. inside its own hook).
    pub fn try_borrow_mut(&self) -> Option<RefMut<'_, T>> {
        let value = self.slot.value.try_borrow_mut().ok()?;
        Some(RefMut::map(value, |value| cast_mut::<T>(&mut **value)))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl<T> Clone for ComponentHandle<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ComponentHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentHandle").field(&self.slot).finish()
    }
}

/// What a hook sees: its own slot and the entity set that owns it.
pub struct ComponentContext<'a> {
    slot: &'a ComponentRef,
    pub entities: &'a mut EntitySet,
}

impl<'a> ComponentContext<'a> {
    pub(crate) fn new(slot: &'a ComponentRef, entities: &'a mut EntitySet) -> Self {
        Self { slot, entities }
    }

    /// The entity owning the running component.
    pub fn entity(&self) -> EntityId {
        self.slot.entity()
    }

    pub fn slot(&self) -> &ComponentRef {
        self.slot
    }

    pub fn set_active(&self, active: bool) {
        self.slot.set_active(active);
    }

    pub fn parent(&self) -> Option<EntityId> {
        self.entities.parent_of(self.entity())
    }

    /// First `T` on the owning entity.
    pub fn get<T: ComponentType>(&self) -> Option<ComponentHandle<T>> {
        self.entities.get::<T>(self.entity())
    }

    /// First `T` on the owning entity, adding one if missing.
    pub fn must_get<T: ComponentType>(&mut self) -> Option<ComponentHandle<T>> {
        let entity = self.entity();
        self.entities.must_get::<T>(entity)
    }

    /// Remove the running component. Its `on_destroy` runs as soon as the
    /// current hook returns.
    pub fn remove_self(&mut self) {
        let slot = Rc::clone(self.slot);
        self.entities.erase_component(&slot);
    }

    /// Create a child entity under the owning entity.
    pub fn add_child(&mut self) -> Option<EntityId> {
        let entity = self.entity();
        self.entities.add_child(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Health(i32);
    impl Component for Health {}

    #[derive(Default)]
    struct Armor;
    impl Component for Armor {}

    fn slot_of(value: Box<dyn Component>) -> ComponentRef {
        ComponentSlot::new(
            EntityId(1),
            ComponentTypeId(0),
            ComponentTypeId(0),
            Rc::from("Health"),
            value,
        )
    }

    #[test]
    fn handle_requires_matching_type() {
        let slot = slot_of(Box::new(Health(10)));
        assert!(slot.is::<Health>());
        assert!(!slot.is::<Armor>());
        assert!(slot.downcast::<Armor>().is_none());

        let handle = slot.downcast::<Health>().unwrap();
        assert_eq!(handle.borrow().0, 10);
        handle.borrow_mut().0 = 3;
        assert_eq!(handle.borrow().0, 3);
        assert_eq!(handle.entity(), EntityId(1));
    }

    #[test]
    fn try_borrow_mut_fails_while_borrowed() {
        let handle = slot_of(Box::new(Health(1))).downcast::<Health>().unwrap();
        let other = handle.clone();
        let guard = handle.borrow_mut();
        assert!(other.try_borrow_mut().is_none());
        drop(guard);
        assert!(other.try_borrow_mut().is_some());
        assert!(handle.ptr_eq(&other));
    }

    #[test]
    fn fresh_slot_state() {
        let slot = slot_of(Box::new(Health(0)));
        assert!(slot.is_active());
        assert!(!slot.is_stored());
        assert!(!slot.is_destroyed());
        assert!(!slot.is_scheduled());
        slot.set_active(false);
        assert!(!slot.is_active());
        assert_eq!(slot.type_name(), "Health");
    }
}
