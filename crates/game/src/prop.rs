//! Physics props: boxes, balls and static slabs dropped into the world.
//!
//! A prop is a physics body paired with a render node. Dynamic props carry an
//! [`Interpolated`] transform so they move smoothly between physics ticks.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use strider_physics::{BodyDesc, BodyHandle, Material, PhysicsWorld, ShapeDesc, Transform};
use strider_world::NodeId;

use crate::interpolation::Interpolated;

/// Description of a prop to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropDesc {
    pub body: BodyDesc,
    /// Blend between physics ticks; otherwise the prop snaps to each tick.
    pub interpolate: bool,
}

impl PropDesc {
    /// A box with the given full size.
    pub fn cuboid(size: Vec3, mass: f32) -> Self {
        Self {
            body: BodyDesc::dynamic(
                ShapeDesc::Cuboid {
                    half_extents: size * 0.5,
                },
                mass,
            ),
            interpolate: true,
        }
    }

    /// A unit cube of 1 kg.
    pub fn cube() -> Self {
        Self::cuboid(Vec3::ONE, 1.0)
    }

    pub fn ball(radius: f32, mass: f32) -> Self {
        Self {
            body: BodyDesc::dynamic(ShapeDesc::Ball { radius }, mass),
            interpolate: true,
        }
    }

    /// A static slab whose top face lies at `y = 0` in its local frame.
    pub fn ground_plane(half_size: f32) -> Self {
        let thickness = 0.5;
        Self {
            body: BodyDesc::fixed(ShapeDesc::Cuboid {
                half_extents: Vec3::new(half_size, thickness, half_size),
            })
            .at(Vec3::new(0.0, -thickness, 0.0)),
            interpolate: false,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.body.transform.translation += position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.body.transform.rotation = rotation;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.body.material = material;
        self
    }

    pub fn interpolated(mut self, interpolate: bool) -> Self {
        self.interpolate = interpolate;
        self
    }
}

/// A spawned prop.
#[derive(Debug, Clone)]
pub struct Prop {
    node: NodeId,
    body: BodyHandle,
    dynamic: bool,
    motion: Interpolated,
}

impl Prop {
    pub(crate) fn spawn(world: &mut dyn PhysicsWorld, node: NodeId, desc: &PropDesc) -> Self {
        let body = world.add_body(&desc.body);
        let mut motion = Interpolated::new(desc.body.transform);
        motion.set_enabled(desc.interpolate);

        Self {
            node,
            body,
            dynamic: desc.body.is_dynamic(),
            motion,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn motion(&self) -> &Interpolated {
        &self.motion
    }

    pub(crate) fn motion_mut(&mut self) -> &mut Interpolated {
        &mut self.motion
    }

    /// Teleport both the body and its snapshots.
    pub fn set_transform(&mut self, world: &mut dyn PhysicsWorld, transform: Transform) {
        world.set_transform(self.body, transform);
        self.motion.teleport(transform);
    }

    pub fn set_position(&mut self, world: &mut dyn PhysicsWorld, position: Vec3) {
        let rotation = self.motion.current().rotation;
        self.set_transform(world, Transform::new(position, rotation));
    }
}
