use crate::components::register_stock_components;
use crate::system::{SystemSet, SystemType};
use scenekit_common::EcsConfig;
use scenekit_ecs::{ComponentRegistry, EntitySet};

/// One entity set plus the systems working on it.
///
/// Systems live exactly as long as the scene. The entity set is dropped
/// first, so component destroy hooks run while systems still exist.
#[derive(Debug)]
pub struct Scene {
    pub entities: EntitySet,
    pub systems: SystemSet,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene with the stock components registered.
    pub fn new() -> Self {
        Self::with_config(EcsConfig::default())
    }

    pub fn with_config(config: EcsConfig) -> Self {
        let mut registry = ComponentRegistry::new();
        register_stock_components(&mut registry);
        Self::with_registry(registry, config)
    }

    pub fn with_registry(registry: ComponentRegistry, config: EcsConfig) -> Self {
        Self {
            entities: EntitySet::with_config(registry, config),
            systems: SystemSet::new(),
        }
    }

    /// The scene's `T`, built on first use.
    pub fn system<T: SystemType>(&mut self) -> &mut T {
        self.systems.get_system::<T>(&mut self.entities)
    }

    /// Run `f` with the scene's `T` and mutable access to the entities.
    pub fn with_system<T: SystemType, R>(
        &mut self,
        f: impl FnOnce(&mut T, &mut EntitySet) -> R,
    ) -> R {
        let system = self.systems.get_system::<T>(&mut self.entities);
        f(system, &mut self.entities)
    }

    /// One frame of component updates. Returns how many hooks ran.
    pub fn update(&mut self) -> usize {
        self.entities.update()
    }
}
