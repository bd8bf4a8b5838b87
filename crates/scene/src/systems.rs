//! Stock systems. Both gather per-frame data for a renderer; neither draws.

use crate::components::{DrawShape, Light, LightKind, Model, Shape, Transform, DRAWABLE_STORAGE};
use crate::system::{System, SystemType};
use glam::{Mat4, Vec3, Vec4};
use scenekit_common::EntityId;
use scenekit_ecs::EntitySet;

/// Most lights a frame carries.
pub const MAX_LIGHTS: usize = 4;

/// A light resolved to world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightInfo {
    pub entity: EntityId,
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
    pub position: Vec3,
}

/// Collects the active lights of the scene.
#[derive(Debug, Default)]
pub struct LightingSystem {
    lights: Vec<LightInfo>,
    dropped: usize,
}

impl System for LightingSystem {
    fn name(&self) -> &'static str {
        Self::NAME
    }
}

impl SystemType for LightingSystem {
    const NAME: &'static str = "LightingSystem";

    fn create(_entities: &mut EntitySet) -> Self {
        Self::default()
    }
}

impl LightingSystem {
    /// Rebuild the light list. Returns how many lights made it in.
    pub fn update_lights(&mut self, entities: &EntitySet) -> usize {
        self.lights.clear();
        self.dropped = 0;
        entities.for_each_component::<Light>(|light| {
            if !light.is_active() {
                return;
            }
            if self.lights.len() == MAX_LIGHTS {
                self.dropped += 1;
                return;
            }
            let entity = light.entity();
            let light = light.borrow();
            self.lights.push(LightInfo {
                entity,
                kind: light.kind,
                color: light.color,
                intensity: light.intensity,
                position: Transform::world_position(entities, entity),
            });
        });
        if self.dropped > 0 {
            tracing::warn!(
                dropped = self.dropped,
                max = MAX_LIGHTS,
                "too many lights, extra ones ignored"
            );
        }
        self.lights.len()
    }

    pub fn lights(&self) -> &[LightInfo] {
        &self.lights
    }

    /// Lights skipped by the last update for exceeding [`MAX_LIGHTS`].
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

/// What to draw for one drawable.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    Shape {
        shape: DrawShape,
        size: Vec3,
        color: Vec4,
    },
    Model {
        mesh: String,
        tint: Vec4,
    },
    /// A drawable type this system does not know how to describe.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub entity: EntityId,
    pub type_name: String,
    pub world: Mat4,
    pub kind: DrawKind,
}

/// Builds the frame's draw list from every active drawable.
#[derive(Debug, Default)]
pub struct DrawListSystem {
    items: Vec<DrawItem>,
}

impl System for DrawListSystem {
    fn name(&self) -> &'static str {
        Self::NAME
    }
}

impl SystemType for DrawListSystem {
    const NAME: &'static str = "DrawListSystem";

    fn create(_entities: &mut EntitySet) -> Self {
        Self::default()
    }
}

impl DrawListSystem {
    pub fn collect(&mut self, entities: &EntitySet) -> &[DrawItem] {
        self.items.clear();
        let Some(storage) = entities.registry().id_of(DRAWABLE_STORAGE) else {
            return &self.items;
        };
        entities.for_each_in_storage(storage, |slot| {
            if !slot.is_active() {
                return;
            }
            let kind = if let Some(shape) = slot.downcast::<Shape>() {
                let shape = shape.borrow();
                DrawKind::Shape {
                    shape: shape.shape,
                    size: shape.size,
                    color: shape.color,
                }
            } else if let Some(model) = slot.downcast::<Model>() {
                let model = model.borrow();
                DrawKind::Model {
                    mesh: model.mesh.clone(),
                    tint: model.tint,
                }
            } else {
                DrawKind::Other
            };
            self.items.push(DrawItem {
                entity: slot.entity(),
                type_name: slot.type_name().to_owned(),
                world: Transform::world_matrix(entities, slot.entity()),
                kind,
            });
        });
        tracing::trace!(items = self.items.len(), "draw list collected");
        &self.items
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::register_stock_components;
    use scenekit_ecs::ComponentRegistry;

    fn stock_set() -> EntitySet {
        let mut registry = ComponentRegistry::new();
        register_stock_components(&mut registry);
        EntitySet::new(registry)
    }

    #[test]
    fn lights_resolve_world_positions() {
        let mut set = stock_set();
        let parent = set.create_entity();
        set.add::<Transform>(parent)
            .unwrap()
            .borrow_mut()
            .set_position(Vec3::new(0.0, 10.0, 0.0));
        let lamp = set.add_child(parent).unwrap();
        set.add::<Light>(lamp).unwrap().borrow_mut().intensity = 2.0;
        set.get::<Transform>(lamp)
            .unwrap()
            .borrow_mut()
            .set_position(Vec3::X);

        let mut lighting = LightingSystem::default();
        assert_eq!(lighting.update_lights(&set), 1);
        let light = lighting.lights()[0];
        assert_eq!(light.entity, lamp);
        assert_eq!(light.intensity, 2.0);
        assert!((light.position - Vec3::new(1.0, 10.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn lights_are_capped_and_inactive_skipped() {
        let mut set = stock_set();
        for _ in 0..MAX_LIGHTS + 2 {
            set.spawn::<Light>().unwrap();
        }
        let off = set.spawn::<Light>().unwrap();
        off.set_active(false);

        let mut lighting = LightingSystem::default();
        assert_eq!(lighting.update_lights(&set), MAX_LIGHTS);
        assert_eq!(lighting.dropped(), 2);
        assert!(lighting.lights().iter().all(|light| light.entity != off.entity()));
    }

    #[test]
    fn draw_list_covers_every_drawable_kind() {
        let mut set = stock_set();
        let e = set.create_entity();
        set.add::<Shape>(e).unwrap().borrow_mut().shape = DrawShape::Cylinder;
        set.add::<Model>(e).unwrap().borrow_mut().mesh = "meshes/crate.obj".into();
        let hidden = set.spawn::<Shape>().unwrap();
        hidden.set_active(false);

        let mut draw = DrawListSystem::default();
        let items = draw.collect(&set);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].type_name, "Shape");
        assert!(matches!(
            items[0].kind,
            DrawKind::Shape {
                shape: DrawShape::Cylinder,
                ..
            }
        ));
        assert_eq!(
            items[1].kind,
            DrawKind::Model {
                mesh: "meshes/crate.obj".into(),
                tint: Vec4::ONE
            }
        );
    }

    #[test]
    fn draw_list_empty_without_drawables() {
        let set = EntitySet::default();
        let mut draw = DrawListSystem::default();
        assert!(draw.collect(&set).is_empty());
        assert!(draw.items().is_empty());
    }
}
