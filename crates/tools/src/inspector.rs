use scenekit_common::EntityId;
use scenekit_ecs::EntitySet;
use scenekit_scene::{EditorHidden, Scene, Transform};

/// Scene inspector for developer tooling.
///
/// Read-only queries against a scene for debugging and editor panels.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene state.
    pub fn summary(scene: &Scene) -> SceneSummary {
        let entities = &scene.entities;
        let mut root_count = 0;
        entities.for_each_root(|_| root_count += 1);
        SceneSummary {
            entity_count: entities.entity_count(),
            root_count,
            component_count: entities.component_count(),
            scheduled_count: entities.scheduled_count(),
            registered_types: entities.registry().len(),
            systems: scene.systems.names(),
        }
    }

    /// Hierarchy, components and placement of one entity.
    pub fn inspect_entity(entities: &EntitySet, id: EntityId) -> Option<EntityInfo> {
        let entity = entities.entity(id)?;
        let mut components = Vec::new();
        entities.for_each_component_on_entity(id, |slot| {
            components.push(ComponentRow {
                name: slot.type_name().to_owned(),
                active: slot.is_active(),
            });
        });
        let transform = entities.get::<Transform>(id);
        Some(EntityInfo {
            id,
            name: entity.name().to_owned(),
            parent: entity.parent(),
            children: entity.children().to_vec(),
            components,
            position: transform.as_ref().map(|t| t.borrow().position().to_array()),
            world_position: Transform::world_position(entities, id).to_array(),
        })
    }

    /// List all entity ids in the scene.
    pub fn list_entities(entities: &EntitySet) -> Vec<EntityId> {
        let mut ids = Vec::with_capacity(entities.entity_count());
        entities.for_each_entity(None, |id| ids.push(id));
        ids
    }

    /// Depth-indented outline rows, roots in id order, children in order.
    /// Subtrees rooted at an [`EditorHidden`] entity are left out.
    pub fn outline(entities: &EntitySet) -> Vec<OutlineRow> {
        let mut rows = Vec::new();
        let mut stack: Vec<(EntityId, usize)> = Vec::new();
        entities.for_each_root(|root| stack.push((root, 0)));
        stack.reverse();

        while let Some((id, depth)) = stack.pop() {
            if entities.has::<EditorHidden>(id) {
                continue;
            }
            rows.push(OutlineRow {
                entity: id,
                depth,
                label: display_name(entities, id),
                has_children: !entities.children_of(id).is_empty(),
            });
            stack.extend(
                entities
                    .children_of(id)
                    .iter()
                    .rev()
                    .map(|child| (*child, depth + 1)),
            );
        }
        rows
    }

    /// Registered component names that may still be added to `entity`:
    /// everything except unique types whose storage the entity already uses.
    pub fn addable_components(entities: &EntitySet, entity: EntityId) -> Vec<String> {
        if !entities.contains_entity(entity) {
            return Vec::new();
        }
        entities
            .registry()
            .iter()
            .filter(|info| !(info.is_unique() && entities.has_component(info.storage(), entity)))
            .map(|info| info.name().to_owned())
            .collect()
    }
}

/// Entity name, or `Entity-{id}` when it has none.
pub fn display_name(entities: &EntitySet, id: EntityId) -> String {
    match entities.entity_name(id) {
        "" => format!("Entity-{}", id.0),
        name => name.to_owned(),
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub entity_count: usize,
    pub root_count: usize,
    pub component_count: usize,
    pub scheduled_count: usize,
    pub registered_types: usize,
    pub systems: Vec<&'static str>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: entities={} roots={} components={} updating={} types={} systems=[{}]",
            self.entity_count,
            self.root_count,
            self.component_count,
            self.scheduled_count,
            self.registered_types,
            self.systems.join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRow {
    pub name: String,
    pub active: bool,
}

/// Detailed info about a single entity.
#[derive(Debug, Clone)]
pub struct EntityInfo {
    pub id: EntityId,
    pub name: String,
    pub parent: Option<EntityId>,
    pub children: Vec<EntityId>,
    pub components: Vec<ComponentRow>,
    /// Local position, if the entity has a transform.
    pub position: Option<[f32; 3]>,
    pub world_position: [f32; 3],
}

impl std::fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parent = self.parent.unwrap_or(EntityId::INVALID);
        write!(
            f,
            "Entity {} '{}' parent={} children={} world=({:.2}, {:.2}, {:.2})",
            self.id,
            self.name,
            parent,
            self.children.len(),
            self.world_position[0],
            self.world_position[1],
            self.world_position[2],
        )?;
        for component in &self.components {
            let state = if component.active { "" } else { " (inactive)" };
            write!(f, "\n  - {}{state}", component.name)?;
        }
        Ok(())
    }
}

/// One line of the scene outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub entity: EntityId,
    pub depth: usize,
    pub label: String,
    pub has_children: bool,
}

impl std::fmt::Display for OutlineRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:indent$}{}", "", self.label, indent = self.depth * 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenekit_scene::{Light, Shape};

    #[test]
    fn summary_empty_scene() {
        let scene = Scene::new();
        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.entity_count, 0);
        assert_eq!(summary.component_count, 0);
        assert!(summary.registered_types > 0);
    }

    #[test]
    fn summary_with_default_scene() {
        let mut scene = Scene::new();
        scene.setup_editor_base_scene().unwrap();
        scene.setup_default_entities().unwrap();

        let summary = SceneInspector::summary(&scene);
        assert_eq!(summary.entity_count, 4);
        assert_eq!(summary.root_count, 3);
        assert_eq!(summary.scheduled_count, 1);
        assert_eq!(summary.systems, vec!["LightingSystem"]);
        let s = format!("{summary}");
        assert!(s.contains("entities=4"));
        assert!(s.contains("LightingSystem"));
    }

    #[test]
    fn inspect_entity_found() {
        let mut scene = Scene::new();
        let e = scene.entities.create_named("lamp");
        scene.entities.add::<Light>(e).unwrap();
        scene
            .entities
            .get::<Transform>(e)
            .unwrap()
            .borrow_mut()
            .set_position(glam::Vec3::new(1.0, 2.0, 3.0));

        let info = SceneInspector::inspect_entity(&scene.entities, e).unwrap();
        assert_eq!(info.name, "lamp");
        assert_eq!(info.position, Some([1.0, 2.0, 3.0]));
        assert_eq!(info.world_position, [1.0, 2.0, 3.0]);
        let names: Vec<_> = info.components.iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"Light"));
        assert!(names.contains(&"Transform"));
        assert!(format!("{info}").contains("'lamp'"));
    }

    #[test]
    fn inspect_entity_not_found() {
        let scene = Scene::new();
        assert!(SceneInspector::inspect_entity(&scene.entities, EntityId(77)).is_none());
    }

    #[test]
    fn list_entities() {
        let mut scene = Scene::new();
        let a = scene.entities.create_entity();
        let b = scene.entities.add_child(a).unwrap();
        let ids = SceneInspector::list_entities(&scene.entities);
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn outline_skips_hidden_subtrees_and_names_unnamed() {
        let mut scene = Scene::new();
        let base = scene.setup_editor_base_scene().unwrap();
        let hidden_child = scene.entities.add_child(base.camera).unwrap();
        let ids = scene.setup_default_entities().unwrap();
        let unnamed = scene.entities.add_child(ids.child).unwrap();

        let rows = SceneInspector::outline(&scene.entities);
        let entities: Vec<_> = rows.iter().map(|row| row.entity).collect();
        assert!(!entities.contains(&base.camera));
        assert!(!entities.contains(&hidden_child));
        assert_eq!(entities, vec![base.light, ids.test_entity, ids.child, unnamed]);

        let last = rows.last().unwrap();
        assert_eq!(last.depth, 2);
        assert_eq!(last.label, format!("Entity-{}", unnamed.0));
        assert_eq!(last.to_string(), format!("    Entity-{}", unnamed.0));
        assert!(rows[1].has_children);
    }

    #[test]
    fn addable_components_hide_present_unique_types() {
        let mut scene = Scene::new();
        let e = scene.entities.create_entity();
        let all = SceneInspector::addable_components(&scene.entities, e);
        assert!(all.contains(&"Light".to_owned()));

        scene.entities.add::<Light>(e).unwrap();
        scene.entities.add::<Shape>(e).unwrap();
        let addable = SceneInspector::addable_components(&scene.entities, e);
        assert!(!addable.contains(&"Light".to_owned()));
        assert!(addable.contains(&"Shape".to_owned()));
        assert!(addable.contains(&"Transform".to_owned()));
        assert!(SceneInspector::addable_components(&scene.entities, EntityId(999)).is_empty());
    }
}
