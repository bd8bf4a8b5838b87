//! Lazily built, per-scene system instances keyed by Rust type.
//!
//! # Invariants
//! - At most one instance per system type per [`SystemSet`].
//! - A system is built on first request and lives as long as its set.

use scenekit_ecs::{AsAny, EntitySet};
use std::any::TypeId;
use std::collections::BTreeMap;

/// A stateful service working across many components, driven explicitly by
/// the host each frame.
pub trait System: AsAny {
    fn name(&self) -> &'static str;
}

/// A system the [`SystemSet`] can build on demand.
pub trait SystemType: System + Sized {
    const NAME: &'static str;

    /// Build the system. Runs once, on the first request for this type.
    fn create(entities: &mut EntitySet) -> Self;
}

/// Owns one instance per system type.
#[derive(Default)]
pub struct SystemSet {
    systems: BTreeMap<TypeId, Box<dyn System>>,
}

impl SystemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance for `T`, building it against `entities` if needed.
    pub fn get_system<T: SystemType>(&mut self, entities: &mut EntitySet) -> &mut T {
        let key = TypeId::of::<T>();
        if !self.systems.contains_key(&key) {
            let system = T::create(entities);
            tracing::debug!(system = T::NAME, "created system");
            self.systems.insert(key, Box::new(system));
        }
        self.find_mut::<T>()
            .expect("system is inserted under its own type id")
    }

    /// Install `system`, dropping any previous instance of the same type.
    pub fn add_system<T: SystemType>(&mut self, system: T) -> &mut T {
        if self
            .systems
            .insert(TypeId::of::<T>(), Box::new(system))
            .is_some()
        {
            tracing::debug!(system = T::NAME, "replaced system");
        }
        self.find_mut::<T>()
            .expect("system is inserted under its own type id")
    }

    /// The instance for `T` if one was built already.
    pub fn find<T: SystemType>(&self) -> Option<&T> {
        self.systems
            .get(&TypeId::of::<T>())
            .and_then(|system| (**system).as_any().downcast_ref::<T>())
    }

    pub fn find_mut<T: SystemType>(&mut self) -> Option<&mut T> {
        self.systems
            .get_mut(&TypeId::of::<T>())
            .and_then(|system| (**system).as_any_mut().downcast_mut::<T>())
    }

    pub fn remove<T: SystemType>(&mut self) -> bool {
        self.systems.remove(&TypeId::of::<T>()).is_some()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Names of the built systems, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.systems.values().map(|system| system.name()).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for SystemSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemSet")
            .field("systems", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        built_with: usize,
        ticks: u32,
    }

    impl System for Counter {
        fn name(&self) -> &'static str {
            Self::NAME
        }
    }

    impl SystemType for Counter {
        const NAME: &'static str = "Counter";

        fn create(entities: &mut EntitySet) -> Self {
            entities.create_named("counter marker");
            Self {
                built_with: entities.entity_count(),
                ticks: 0,
            }
        }
    }

    struct Other;

    impl System for Other {
        fn name(&self) -> &'static str {
            Self::NAME
        }
    }

    impl SystemType for Other {
        const NAME: &'static str = "Other";

        fn create(_entities: &mut EntitySet) -> Self {
            Self
        }
    }

    #[test]
    fn systems_are_built_once() {
        let mut entities = EntitySet::default();
        let mut systems = SystemSet::new();
        assert!(systems.find::<Counter>().is_none());

        systems.get_system::<Counter>(&mut entities).ticks += 1;
        systems.get_system::<Counter>(&mut entities).ticks += 1;

        let counter = systems.find::<Counter>().unwrap();
        assert_eq!(counter.ticks, 2);
        assert_eq!(counter.built_with, 1);
        assert_eq!(entities.entity_count(), 1);
        assert_eq!(systems.len(), 1);
    }

    #[test]
    fn add_system_replaces_instance() {
        let mut entities = EntitySet::default();
        let mut systems = SystemSet::new();
        systems.get_system::<Counter>(&mut entities).ticks = 9;

        systems.add_system(Counter {
            built_with: 0,
            ticks: 1,
        });
        assert_eq!(systems.find::<Counter>().unwrap().ticks, 1);
        assert_eq!(systems.len(), 1);
    }

    #[test]
    fn systems_are_keyed_by_type() {
        let mut entities = EntitySet::default();
        let mut systems = SystemSet::new();
        systems.get_system::<Other>(&mut entities);
        systems.get_system::<Counter>(&mut entities);
        assert_eq!(systems.names(), vec!["Counter", "Other"]);

        assert!(systems.remove::<Other>());
        assert!(!systems.remove::<Other>());
        assert!(systems.find_mut::<Other>().is_none());
    }

    #[test]
    fn separate_sets_do_not_share_instances() {
        let mut entities = EntitySet::default();
        let mut first = SystemSet::new();
        let mut second = SystemSet::new();
        first.get_system::<Counter>(&mut entities).ticks = 5;
        assert_eq!(second.get_system::<Counter>(&mut entities).ticks, 0);
    }
}
