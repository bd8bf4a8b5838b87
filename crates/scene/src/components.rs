//! Stock components: transforms, movers, lights, drawables and editor markers.
//!
//! Drawables share one storage table (`"Drawable"`) so renderers can walk
//! every drawable kind in a single pass while inspectors still see the
//! concrete type name.

use glam::{EulerRot, Mat4, Quat, Vec3, Vec4};
use scenekit_common::EntityId;
use scenekit_ecs::{Component, ComponentContext, ComponentRegistry, ComponentType, EntitySet};
use serde::{Deserialize, Serialize};

/// Storage shared by every drawable component type.
pub const DRAWABLE_STORAGE: &str = "Drawable";

/// Local position and orientation of an entity.
///
/// World placement is the product of local matrices up the parent chain and
/// stops at the first ancestor without a transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    position: Vec3,
    orientation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
        }
    }
}

impl Component for Transform {}

impl ComponentType for Transform {
    const NAME: &'static str = "Transform";
}

impl Transform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
    }

    /// Pitch, yaw and roll in degrees.
    pub fn euler_degrees(&self) -> Vec3 {
        let (x, y, z) = self.orientation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z) * (180.0 / std::f32::consts::PI)
    }

    pub fn set_euler_degrees(&mut self, angles: Vec3) {
        let radians = angles * (std::f32::consts::PI / 180.0);
        self.orientation = Quat::from_euler(EulerRot::XYZ, radians.x, radians.y, radians.z);
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn left(&self) -> Vec3 {
        self.up().cross(self.forward())
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up())
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.position += self.forward() * distance;
    }

    pub fn move_up(&mut self, distance: f32) {
        self.position += self.up() * distance;
    }

    pub fn move_left(&mut self, distance: f32) {
        self.position += self.left() * distance;
    }

    /// Rotate about the local up axis.
    pub fn rotate_yaw(&mut self, degrees: f32) {
        self.orientation =
            (self.orientation * Quat::from_rotation_y(-degrees.to_radians())).normalize();
    }

    pub fn rotate_pitch(&mut self, degrees: f32) {
        self.orientation =
            (self.orientation * Quat::from_rotation_x(degrees.to_radians())).normalize();
    }

    pub fn rotate_roll(&mut self, degrees: f32) {
        self.orientation =
            (self.orientation * Quat::from_rotation_z(-degrees.to_radians())).normalize();
    }

    /// Rotate about the world up axis.
    pub fn rotate_heading(&mut self, degrees: f32) {
        self.orientation =
            (Quat::from_rotation_y(-degrees.to_radians()) * self.orientation).normalize();
    }

    /// Face `target` from the current position.
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        let direction = target - self.position;
        if direction.length_squared() <= f32::EPSILON {
            return;
        }
        let view = Mat4::look_to_rh(Vec3::ZERO, direction.normalize(), up);
        // look_to_rh builds a view matrix looking down -Z; flip to face +Z.
        let flip = Quat::from_rotation_y(std::f32::consts::PI);
        self.orientation = (Quat::from_mat4(&view).inverse() * flip).normalize();
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// World matrix of `entity`, identity when it has no transform.
    ///
    /// Panics if a transform on the chain is mutably borrowed.
    pub fn world_matrix(entities: &EntitySet, entity: EntityId) -> Mat4 {
        let mut world = Mat4::IDENTITY;
        let mut cursor = Some(entity);
        for _ in 0..=entities.entity_count() {
            let Some(id) = cursor else {
                break;
            };
            let Some(transform) = entities.get::<Transform>(id) else {
                break;
            };
            world = transform.borrow().local_matrix() * world;
            cursor = entities.parent_of(id);
        }
        world
    }

    pub fn world_position(entities: &EntitySet, entity: EntityId) -> Vec3 {
        Self::world_matrix(entities, entity).transform_point3(Vec3::ZERO)
    }

    /// Express a world-space point in `entity`'s local space.
    pub fn to_local(entities: &EntitySet, entity: EntityId, point: Vec3) -> Vec3 {
        Self::world_matrix(entities, entity)
            .inverse()
            .transform_point3(point)
    }

    /// Make `entity` a root while keeping its world placement.
    ///
    /// Returns `false` if it already is a root or has no transform.
    pub fn detach(entities: &mut EntitySet, entity: EntityId) -> bool {
        if entities.parent_of(entity).is_none() {
            return false;
        }
        let Some(transform) = entities.get::<Transform>(entity) else {
            return false;
        };
        let (_, rotation, translation) =
            Self::world_matrix(entities, entity).to_scale_rotation_translation();
        {
            let mut transform = transform.borrow_mut();
            transform.position = translation;
            transform.orientation = rotation.normalize();
        }
        entities.reparent(entity, None)
    }
}

/// Moves and spins its entity's transform every frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoMover {
    /// Units per second along world axes.
    pub linear_speed: Vec3,
    /// Degrees per second around pitch, yaw and roll.
    pub angular_speed: Vec3,
    /// Seconds per frame.
    pub step: f32,
}

impl Default for AutoMover {
    fn default() -> Self {
        Self {
            linear_speed: Vec3::ZERO,
            angular_speed: Vec3::ZERO,
            step: 1.0 / 60.0,
        }
    }
}

impl Component for AutoMover {
    fn wants_update(&self) -> bool {
        true
    }

    fn on_create(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.must_get::<Transform>();
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(transform) = ctx.must_get::<Transform>() else {
            return;
        };
        let Some(mut transform) = transform.try_borrow_mut() else {
            return;
        };
        transform.translate(self.linear_speed * self.step);
        let spin = self.angular_speed * self.step;
        transform.rotate_pitch(spin.x);
        transform.rotate_yaw(spin.y);
        transform.rotate_roll(spin.z);
    }
}

impl ComponentType for AutoMover {
    const NAME: &'static str = "AutoMover";
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    Directional,
    #[default]
    Point,
}

/// A light source. One per entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

impl Component for Light {
    fn on_create(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.must_get::<Transform>();
    }
}

impl ComponentType for Light {
    const NAME: &'static str = "Light";
    const UNIQUE: bool = true;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawShape {
    #[default]
    Box,
    Sphere,
    Cylinder,
    Plane,
}

/// A primitive drawable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub shape: DrawShape,
    pub size: Vec3,
    /// RGBA, 0..1.
    pub color: Vec4,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            shape: DrawShape::Box,
            size: Vec3::ONE,
            color: Vec4::ONE,
        }
    }
}

impl Component for Shape {
    fn on_create(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.must_get::<Transform>();
    }
}

impl ComponentType for Shape {
    const NAME: &'static str = "Shape";
    const STORAGE: &'static str = DRAWABLE_STORAGE;
}

/// A drawable referencing a mesh asset by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub mesh: String,
    pub tint: Vec4,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            mesh: String::new(),
            tint: Vec4::ONE,
        }
    }
}

impl Component for Model {
    fn on_create(&mut self, ctx: &mut ComponentContext<'_>) {
        ctx.must_get::<Transform>();
    }
}

impl ComponentType for Model {
    const NAME: &'static str = "Model";
    const STORAGE: &'static str = DRAWABLE_STORAGE;
}

/// Viewpoint data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov_y: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self { fov_y: 45.0 }
    }
}

impl Component for Camera {}

impl ComponentType for Camera {
    const NAME: &'static str = "Camera";
    const UNIQUE: bool = true;
}

/// Keeps an entity and its subtree out of the editor outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorHidden;

impl Component for EditorHidden {}

impl ComponentType for EditorHidden {
    const NAME: &'static str = "EditorHidden";
    const UNIQUE: bool = true;
}

/// Register every stock component type.
pub fn register_stock_components(registry: &mut ComponentRegistry) {
    registry.register::<Transform>();
    registry.register::<AutoMover>();
    registry.register::<Light>();
    registry.register::<Shape>();
    registry.register::<Model>();
    registry.register::<Camera>();
    registry.register::<EditorHidden>();
}
