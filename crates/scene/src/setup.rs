//! Stock scene contents used by the editor and the CLI.

use crate::components::{AutoMover, Camera, DrawShape, EditorHidden, Light, Shape, Transform};
use crate::scene::Scene;
use crate::systems::LightingSystem;
use glam::{Vec3, Vec4};
use scenekit_common::EntityId;
use scenekit_ecs::EntitySet;

/// Entities made by [`Scene::setup_editor_base_scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorEntities {
    pub camera: EntityId,
    pub light: EntityId,
}

/// Entities made by [`Scene::setup_default_entities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultEntities {
    pub test_entity: EntityId,
    pub child: EntityId,
}

impl Scene {
    /// Hidden editor camera plus a default light.
    ///
    /// `None` if a stock component cannot be created, e.g. when it is not
    /// registered and auto-registration is off. Entities made before the
    /// failure are removed again.
    pub fn setup_editor_base_scene(&mut self) -> Option<EditorEntities> {
        let camera = self.entities.create_named("Editor Camera");
        if build_editor_camera(&mut self.entities, camera).is_none() {
            self.entities.remove_entity(camera, true);
            return None;
        }

        self.system::<LightingSystem>();

        let light = self.entities.create_named("Default Light");
        if build_default_light(&mut self.entities, light).is_none() {
            self.entities.remove_entity(light, true);
            self.entities.remove_entity(camera, true);
            return None;
        }

        tracing::debug!(%camera, %light, "editor base scene ready");
        Some(EditorEntities { camera, light })
    }

    /// A spinning test box with a sphere child. Removed again on failure.
    pub fn setup_default_entities(&mut self) -> Option<DefaultEntities> {
        let test_entity = self.entities.create_named("Test Entity");
        let Some(child) = build_test_entity(&mut self.entities, test_entity) else {
            self.entities.remove_entity(test_entity, true);
            return None;
        };

        tracing::debug!(%test_entity, %child, "default entities ready");
        Some(DefaultEntities { test_entity, child })
    }
}

fn build_editor_camera(entities: &mut EntitySet, camera: EntityId) -> Option<()> {
    entities
        .add::<Transform>(camera)?
        .borrow_mut()
        .set_position(Vec3::new(0.0, 1.5, -3.0));
    entities.add::<Camera>(camera)?;
    entities.add::<EditorHidden>(camera)?;
    Some(())
}

fn build_default_light(entities: &mut EntitySet, light: EntityId) -> Option<()> {
    entities.add::<Light>(light)?;
    entities
        .must_get::<Transform>(light)?
        .borrow_mut()
        .set_position(Vec3::splat(10.0));
    entities.must_get::<Shape>(light)?.borrow_mut().shape = DrawShape::Sphere;
    Some(())
}

/// Fill in the test entity and create its child. Returns the child.
fn build_test_entity(entities: &mut EntitySet, test_entity: EntityId) -> Option<EntityId> {
    entities
        .add::<Transform>(test_entity)?
        .borrow_mut()
        .set_position(Vec3::new(0.0, 0.5, 0.0));
    {
        let body = entities.add::<Shape>(test_entity)?;
        let mut body = body.borrow_mut();
        body.color = Vec4::new(0.0, 0.89, 0.19, 1.0);
        body.size = Vec3::ONE;
    }
    entities
        .must_get::<AutoMover>(test_entity)?
        .borrow_mut()
        .angular_speed
        .y = 90.0;

    let child = entities.add_child(test_entity)?;
    entities.set_entity_name(child, "Child");
    entities
        .add::<Transform>(child)?
        .borrow_mut()
        .set_position(Vec3::new(0.0, 1.0, 0.0));
    {
        let body = entities.add::<Shape>(child)?;
        let mut body = body.borrow_mut();
        body.color = Vec4::new(0.0, 0.32, 0.67, 1.0);
        body.shape = DrawShape::Sphere;
        body.size = Vec3::splat(0.5);
    }
    Some(child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::DrawListSystem;
    use scenekit_common::EcsConfig;
    use scenekit_ecs::ComponentRegistry;

    #[test]
    fn editor_base_scene_has_hidden_camera_and_light() {
        let mut scene = Scene::new();
        let base = scene.setup_editor_base_scene().unwrap();

        assert_eq!(scene.entities.entity_name(base.camera), "Editor Camera");
        assert!(scene.entities.has::<EditorHidden>(base.camera));
        assert!(scene.entities.has::<Camera>(base.camera));
        assert!(scene.systems.find::<LightingSystem>().is_some());

        let light_pos = Transform::world_position(&scene.entities, base.light);
        assert_eq!(light_pos, Vec3::splat(10.0));
        let shape = scene.entities.get::<Shape>(base.light).unwrap();
        assert_eq!(shape.borrow().shape, DrawShape::Sphere);
    }

    #[test]
    fn default_entities_spin_and_nest() {
        let mut scene = Scene::new();
        let ids = scene.setup_default_entities().unwrap();

        assert_eq!(scene.entities.parent_of(ids.child), Some(ids.test_entity));
        assert_eq!(scene.entities.entity_name(ids.child), "Child");
        let child_pos = Transform::world_position(&scene.entities, ids.child);
        assert!((child_pos - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-4);

        let before = scene
            .entities
            .get::<Transform>(ids.test_entity)
            .unwrap()
            .borrow()
            .orientation();
        assert_eq!(scene.update(), 1);
        let after = scene
            .entities
            .get::<Transform>(ids.test_entity)
            .unwrap()
            .borrow()
            .orientation();
        assert_ne!(before, after);

        let items = scene.with_system::<DrawListSystem, _>(|draw, entities| {
            draw.collect(entities).len()
        });
        assert_eq!(items, 2);
    }

    #[test]
    fn setup_fails_soft_without_registrations() {
        let config = EcsConfig {
            auto_register: false,
            ..EcsConfig::default()
        };
        let mut scene = Scene::with_registry(ComponentRegistry::new(), config);
        assert!(scene.setup_default_entities().is_none());
        assert_eq!(scene.entities.entity_count(), 0);
    }

    #[test]
    fn failed_base_scene_leaves_nothing_behind() {
        let config = EcsConfig {
            auto_register: false,
            ..EcsConfig::default()
        };
        let mut registry = ComponentRegistry::new();
        registry.register::<Transform>();
        registry.register::<Camera>();
        registry.register::<EditorHidden>();
        let mut scene = Scene::with_registry(registry, config);

        // Camera builds fine, the light has no registered Light type.
        assert!(scene.setup_editor_base_scene().is_none());
        assert_eq!(scene.entities.entity_count(), 0);
        assert_eq!(scene.entities.component_count(), 0);
    }
}
