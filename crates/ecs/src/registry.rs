//! Component type registry: names, ids, uniqueness flags and factories.
//!
//! Ids are small integers handed out the first time a name is seen, so they
//! only mean something inside the registry that assigned them. A name maps to
//! exactly one id, which means by-name lookup is never ambiguous.

use crate::component::{Component, ComponentRef, ComponentSlot, ComponentType};
use scenekit_common::{ComponentTypeId, EntityId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// Builds a fresh component for an owning entity.
pub type ComponentFactory = Rc<dyn Fn(EntityId) -> Box<dyn Component>>;

/// Registered description of a component type.
#[derive(Clone)]
pub struct ComponentInfo {
    id: ComponentTypeId,
    storage: ComponentTypeId,
    name: Rc<str>,
    unique: bool,
    factory: ComponentFactory,
}

impl ComponentInfo {
    pub fn id(&self) -> ComponentTypeId {
        self.id
    }

    /// Table the instances are stored in; differs from `id` for derived types.
    pub fn storage(&self) -> ComponentTypeId {
        self.storage
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    fn instantiate(&self, entity: EntityId) -> ComponentRef {
        let value = (self.factory)(entity);
        ComponentSlot::new(entity, self.id, self.storage, Rc::clone(&self.name), value)
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("storage", &self.storage)
            .field("name", &self.name)
            .field("unique", &self.unique)
            .finish_non_exhaustive()
    }
}

/// Maps component names and ids to their descriptors.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    names: Vec<Rc<str>>,
    ids: HashMap<Rc<str>, ComponentTypeId>,
    infos: BTreeMap<ComponentTypeId, ComponentInfo>,
    order: Vec<ComponentTypeId>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `name`, assigning the next free one if unseen.
    pub fn intern(&mut self, name: &str) -> ComponentTypeId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = ComponentTypeId(self.names.len() as u32);
        let name: Rc<str> = Rc::from(name);
        self.names.push(Rc::clone(&name));
        self.ids.insert(name, id);
        id
    }

    /// Id previously assigned to `name`.
    pub fn id_of(&self, name: &str) -> Option<ComponentTypeId> {
        self.ids.get(name).copied()
    }

    pub fn name_of(&self, id: ComponentTypeId) -> Option<&str> {
        self.names.get(id.0 as usize).map(|name| &**name)
    }

    /// Storage table id for `T`, if its storage name has been seen.
    pub fn storage_id_of<T: ComponentType>(&self) -> Option<ComponentTypeId> {
        self.id_of(T::STORAGE)
    }

    /// Register or replace a component type.
    ///
    /// `storage` names the table instances live in; pass the type's own name
    /// unless it shares a base type's table.
    pub fn register_with(
        &mut self,
        name: &str,
        storage: &str,
        unique: bool,
        factory: impl Fn(EntityId) -> Box<dyn Component> + 'static,
    ) -> ComponentTypeId {
        let id = self.intern(name);
        let storage = self.intern(storage);
        let info = ComponentInfo {
            id,
            storage,
            name: Rc::clone(&self.names[id.0 as usize]),
            unique,
            factory: Rc::new(factory),
        };
        if self.infos.insert(id, info).is_some() {
            tracing::debug!(component = name, "replaced component registration");
        } else {
            self.order.push(id);
            tracing::debug!(component = name, %id, %storage, unique, "registered component type");
        }
        id
    }

    pub fn register<T: ComponentType>(&mut self) -> ComponentTypeId {
        self.register_with(T::NAME, T::STORAGE, T::UNIQUE, |_| Box::new(T::default()))
    }

    pub fn is_registered(&self, id: ComponentTypeId) -> bool {
        self.infos.contains_key(&id)
    }

    pub fn info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(&id)
    }

    pub fn info_by_name(&self, name: &str) -> Option<&ComponentInfo> {
        self.id_of(name).and_then(|id| self.info(id))
    }

    /// Descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> + '_ {
        self.order.iter().filter_map(|id| self.infos.get(id))
    }

    pub fn len(&self) -> usize {
        self.infos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// New unstored component of type `id` for `entity`.
    pub fn instantiate(&self, id: ComponentTypeId, entity: EntityId) -> Option<ComponentRef> {
        self.info(id).map(|info| info.instantiate(entity))
    }

    pub fn instantiate_by_name(&self, name: &str, entity: EntityId) -> Option<ComponentRef> {
        self.info_by_name(name).map(|info| info.instantiate(entity))
    }

    /// New unstored `T` for `entity`, registering `T` first when it is unknown
    /// and `auto_register` allows it.
    pub fn instantiate_typed<T: ComponentType>(
        &mut self,
        entity: EntityId,
        auto_register: bool,
    ) -> Option<ComponentRef> {
        if let Some(component) = self.instantiate_by_name(T::NAME, entity) {
            return Some(component);
        }
        if !auto_register {
            tracing::debug!(component = T::NAME, "component type not registered");
            return None;
        }
        tracing::debug!(component = T::NAME, "auto-registering component type");
        let id = self.register::<T>();
        self.instantiate(id, entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Light {
        intensity: f32,
    }
    impl Component for Light {}
    impl ComponentType for Light {
        const NAME: &'static str = "Light";
        const UNIQUE: bool = true;
    }

    #[derive(Default)]
    struct Drawable;
    impl Component for Drawable {}
    impl ComponentType for Drawable {
        const NAME: &'static str = "Drawable";
    }

    #[derive(Default)]
    struct Shape;
    impl Component for Shape {}
    impl ComponentType for Shape {
        const NAME: &'static str = "Shape";
        const STORAGE: &'static str = "Drawable";
    }

    #[test]
    fn register_assigns_ids_in_order() {
        let mut registry = ComponentRegistry::new();
        let light = registry.register::<Light>();
        let drawable = registry.register::<Drawable>();
        assert_ne!(light, drawable);
        assert_eq!(registry.id_of("Light"), Some(light));
        assert_eq!(registry.name_of(drawable), Some("Drawable"));
        assert!(registry.info(light).unwrap().is_unique());
        let names: Vec<_> = registry.iter().map(|info| info.name().to_owned()).collect();
        assert_eq!(names, vec!["Light", "Drawable"]);
    }

    #[test]
    fn reregistering_overwrites() {
        let mut registry = ComponentRegistry::new();
        let first = registry.register::<Light>();
        let second = registry.register_with("Light", "Light", false, |_| {
            Box::new(Light { intensity: 2.0 })
        });
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
        assert!(!registry.info(first).unwrap().is_unique());

        let slot = registry.instantiate(first, EntityId(0)).unwrap();
        let light = slot.downcast::<Light>().unwrap();
        assert_eq!(light.borrow().intensity, 2.0);
    }

    #[test]
    fn derived_type_shares_storage() {
        let mut registry = ComponentRegistry::new();
        let shape = registry.register::<Shape>();
        let drawable = registry.register::<Drawable>();
        let info = registry.info(shape).unwrap();
        assert_eq!(info.storage(), drawable);
        assert_ne!(info.id(), info.storage());
        assert_eq!(registry.storage_id_of::<Shape>(), Some(drawable));

        let slot = registry.instantiate(shape, EntityId(5)).unwrap();
        assert_eq!(slot.type_name(), "Shape");
        assert_eq!(slot.storage_id(), drawable);
        assert_eq!(slot.entity(), EntityId(5));
    }

    #[test]
    fn unknown_lookups_return_none() {
        let registry = ComponentRegistry::new();
        assert!(registry.instantiate(ComponentTypeId(3), EntityId(0)).is_none());
        assert!(registry.instantiate_by_name("Ghost", EntityId(0)).is_none());
        assert!(registry.id_of("Ghost").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn typed_instantiation_auto_registers() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.instantiate_typed::<Light>(EntityId(1), false).is_none());
        assert!(registry.is_empty());

        let slot = registry.instantiate_typed::<Light>(EntityId(1), true).unwrap();
        assert!(slot.is::<Light>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn interned_storage_name_is_not_registered() {
        let mut registry = ComponentRegistry::new();
        registry.register::<Shape>();
        let drawable = registry.id_of("Drawable").unwrap();
        assert!(!registry.is_registered(drawable));
        assert!(registry.instantiate(drawable, EntityId(0)).is_none());
    }
}
