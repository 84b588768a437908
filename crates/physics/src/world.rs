//! The physics-world seam.
//!
//! Game and terrain code only ever talk to a solver through this trait. Bodies
//! are addressed by [`BodyHandle`]; operations on a handle that is not (or no
//! longer) registered are silent no-ops.

use glam::Vec3;

use crate::body::{BodyDesc, BodyHandle, BodyState, RayHit, Transform};

/// A steppable collection of rigid bodies.
pub trait PhysicsWorld {
    /// Register a body and return its handle.
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle;

    /// Unregister a body. Returns `false` if it was not registered.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    fn contains_body(&self, handle: BodyHandle) -> bool;

    fn body_count(&self) -> usize;

    /// Advance the simulation by `dt` seconds. Runs to completion.
    fn step(&mut self, dt: f32);

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState>;

    /// Apply an instantaneous momentum change (N·s) and wake the body.
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3);

    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3);

    /// Teleport a body.
    fn set_transform(&mut self, handle: BodyHandle, transform: Transform);

    fn set_rotation_locked(&mut self, handle: BodyHandle, locked: bool);

    fn set_angular_damping(&mut self, handle: BodyHandle, damping: f32);

    /// Cast a ray and return the closest hit within `max_distance`.
    ///
    /// `direction` is normalized internally; a zero direction never hits.
    /// `exclude` skips one body (typically the caster itself).
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<BodyHandle>,
    ) -> Option<RayHit>;
}
