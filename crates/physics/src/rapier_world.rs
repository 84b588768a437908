//! [`PhysicsWorld`] backed by Rapier.
//!
//! World convention is Y-up. Heightfields are converted from the row-major
//! `x`-outer layout of [`HeightFieldDesc`] into Rapier's `z`-rows/`x`-columns
//! matrix and shifted so their local origin sits on the `(0, 0)` corner.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use rapier3d::na::{DMatrix, Isometry3, Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use crate::body::{
    BodyDesc, BodyHandle, BodyKind, BodyState, HeightFieldDesc, RayHit, ShapeDesc, Transform,
};
use crate::world::PhysicsWorld;

/// Earth gravity along -Y (m/s²).
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.82, 0.0);

struct BodyEntry {
    rigid: RigidBodyHandle,
    mass: f32,
}

/// Rapier rigid-body world.
pub struct RapierWorld {
    gravity: Vector<Real>,
    physics_pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Query pipeline for raycasts.
    query_pipeline: QueryPipeline,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    bodies: HashMap<BodyHandle, BodyEntry>,
    owners: HashMap<RigidBodyHandle, BodyHandle>,
    next_handle: u64,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY)
    }
}

impl RapierWorld {
    pub fn new(gravity: Vec3) -> Self {
        Self {
            gravity: to_vector(gravity),
            physics_pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            bodies: HashMap::new(),
            owners: HashMap::new(),
            next_handle: 1,
        }
    }

    pub fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }

    fn rigid_body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        let rigid = self.bodies.get(&handle)?.rigid;
        self.rigid_body_set.get_mut(rigid)
    }

    fn build_collider(desc: &BodyDesc) -> ColliderBuilder {
        let builder = match &desc.shape {
            ShapeDesc::Ball { radius } => ColliderBuilder::ball(*radius),
            ShapeDesc::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ShapeDesc::HeightField(field) => heightfield_collider(field),
        };

        let builder = builder
            .friction(desc.material.friction)
            .restitution(desc.material.restitution);

        match desc.kind {
            BodyKind::Dynamic { mass } => builder.mass(mass),
            BodyKind::Static => builder,
        }
    }
}

impl PhysicsWorld for RapierWorld {
    fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
        let builder = match desc.kind {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic { .. } => RigidBodyBuilder::dynamic(),
        };
        let mut builder = builder
            .position(to_isometry(&desc.transform))
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .can_sleep(desc.sleep.enabled);
        if desc.lock_rotations {
            builder = builder.lock_rotations();
        }

        let rigid = self.rigid_body_set.insert(builder.build());
        self.collider_set.insert_with_parent(
            Self::build_collider(desc).build(),
            rigid,
            &mut self.rigid_body_set,
        );

        if let Some(body) = self.rigid_body_set.get_mut(rigid) {
            body.recompute_mass_properties_from_colliders(&self.collider_set);
            let activation = body.activation_mut();
            activation.normalized_linear_threshold = desc.sleep.linear_threshold;
            activation.time_until_sleep = desc.sleep.time_until_sleep;
        }
        self.query_pipeline.update(&self.collider_set);

        let handle = BodyHandle(self.next_handle);
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            BodyEntry {
                rigid,
                mass: desc.mass(),
            },
        );
        self.owners.insert(rigid, handle);

        log::debug!("Added body {:?} ({} total)", handle, self.bodies.len());
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        let Some(entry) = self.bodies.remove(&handle) else {
            return false;
        };
        self.owners.remove(&entry.rigid);

        self.rigid_body_set.remove(
            entry.rigid,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        self.query_pipeline.update(&self.collider_set);

        log::debug!("Removed body {:?} ({} left)", handle, self.bodies.len());
        true
    }

    fn contains_body(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(&handle)
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }

    fn step(&mut self, dt: f32) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }
        self.integration_parameters.dt = dt;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    fn body_state(&self, handle: BodyHandle) -> Option<BodyState> {
        let entry = self.bodies.get(&handle)?;
        let body = self.rigid_body_set.get(entry.rigid)?;

        Some(BodyState {
            transform: from_isometry(body.position()),
            linear_velocity: from_vector(body.linvel()),
            angular_velocity: from_vector(body.angvel()),
            mass: entry.mass,
            sleeping: body.is_sleeping(),
        })
    }

    fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec3) {
        if let Some(body) = self.rigid_body_mut(handle) {
            body.apply_impulse(to_vector(impulse), true);
        }
    }

    fn set_linear_velocity(&mut self, handle: BodyHandle, velocity: Vec3) {
        if let Some(body) = self.rigid_body_mut(handle) {
            body.set_linvel(to_vector(velocity), true);
        }
    }

    fn set_transform(&mut self, handle: BodyHandle, transform: Transform) {
        if let Some(body) = self.rigid_body_mut(handle) {
            body.set_position(to_isometry(&transform), true);
        }
    }

    fn set_rotation_locked(&mut self, handle: BodyHandle, locked: bool) {
        if let Some(body) = self.rigid_body_mut(handle) {
            // Locking must not wake a sleeping body, or it never settles.
            body.lock_rotations(locked, false);
        }
    }

    fn set_angular_damping(&mut self, handle: BodyHandle, damping: f32) {
        if let Some(body) = self.rigid_body_mut(handle) {
            body.set_angular_damping(damping);
        }
    }

    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        exclude: Option<BodyHandle>,
    ) -> Option<RayHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO || !(max_distance > 0.0) {
            return None;
        }

        let ray = Ray::new(point![origin.x, origin.y, origin.z], to_vector(dir));
        let mut filter = QueryFilter::default();
        if let Some(entry) = exclude.and_then(|h| self.bodies.get(&h)) {
            filter = filter.exclude_rigid_body(entry.rigid);
        }

        let (collider, distance) = self.query_pipeline.cast_ray(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
        )?;

        let body = self
            .collider_set
            .get(collider)
            .and_then(|c| c.parent())
            .and_then(|rigid| self.owners.get(&rigid))
            .copied()?;

        Some(RayHit {
            body,
            distance,
            point: origin + dir * distance,
        })
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn heightfield_collider(field: &HeightFieldDesc) -> ColliderBuilder {
    let heights = DMatrix::from_fn(field.samples_z(), field.samples_x(), |row, col| {
        field.height(col, row)
    });
    let (width, depth) = (field.extent_x(), field.extent_z());

    ColliderBuilder::heightfield(heights, vector![width, 1.0, depth])
        .translation(vector![width * 0.5, 0.0, depth * 0.5])
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_isometry(transform: &Transform) -> Isometry<Real> {
    let t = transform.translation;
    let q = transform.rotation.normalize();
    Isometry3::from_parts(
        Translation3::new(t.x, t.y, t.z),
        UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

fn from_isometry(iso: &Isometry<Real>) -> Transform {
    let t = iso.translation.vector;
    let r = iso.rotation;
    Transform::new(Vec3::new(t.x, t.y, t.z), Quat::from_xyzw(r.i, r.j, r.k, r.w))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Material, SleepConfig};

    fn ground(world: &mut RapierWorld) -> BodyHandle {
        world.add_body(
            &BodyDesc::fixed(ShapeDesc::Cuboid {
                half_extents: Vec3::new(50.0, 0.5, 50.0),
            })
            .at(Vec3::new(0.0, -0.5, 0.0)),
        )
    }

    #[test]
    fn test_add_and_remove_body() {
        let mut world = RapierWorld::default();
        let handle = ground(&mut world);

        assert!(world.contains_body(handle));
        assert_eq!(world.body_count(), 1);

        assert!(world.remove_body(handle));
        assert!(!world.contains_body(handle));
        assert_eq!(world.body_count(), 0);

        // Second removal is a no-op
        assert!(!world.remove_body(handle));
        assert!(world.body_state(handle).is_none());
    }

    #[test]
    fn test_dynamic_body_falls() {
        let mut world = RapierWorld::default();
        let ball = world.add_body(
            &BodyDesc::dynamic(ShapeDesc::Ball { radius: 0.5 }, 1.0).at(Vec3::new(0.0, 10.0, 0.0)),
        );

        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }

        let state = world.body_state(ball).unwrap();
        assert!(state.position().y < 10.0, "ball should fall, y={}", state.position().y);
        assert!(state.linear_velocity.y < 0.0);
        assert_eq!(state.mass, 1.0);
    }

    #[test]
    fn test_ball_rests_on_ground() {
        let mut world = RapierWorld::default();
        ground(&mut world);
        let ball = world.add_body(
            &BodyDesc::dynamic(ShapeDesc::Ball { radius: 0.5 }, 1.0)
                .at(Vec3::new(0.0, 2.0, 0.0))
                .with_material(Material {
                    friction: 0.5,
                    restitution: 0.0,
                })
                .with_sleep(SleepConfig::default()),
        );

        for _ in 0..300 {
            world.step(1.0 / 60.0);
        }

        let y = world.body_state(ball).unwrap().position().y;
        assert!((y - 0.5).abs() < 0.05, "ball should rest on ground, y={}", y);
    }

    #[test]
    fn test_impulse_changes_velocity_by_inverse_mass() {
        let mut world = RapierWorld::new(Vec3::ZERO);
        let ball = world.add_body(&BodyDesc::dynamic(ShapeDesc::Ball { radius: 1.0 }, 10.0));

        world.apply_impulse(ball, Vec3::new(0.0, 50.0, 0.0));

        let v = world.body_state(ball).unwrap().linear_velocity;
        assert!((v.y - 5.0).abs() < 1e-3, "expected 5 m/s, got {}", v.y);
    }

    #[test]
    fn test_raycast_hits_heightfield_in_expected_orientation() {
        let mut world = RapierWorld::default();

        // Plane h = x + 2z sampled on a 4x3 lattice with unit spacing
        let (nx, nz) = (4, 3);
        let mut heights = Vec::new();
        for ix in 0..nx {
            for iz in 0..nz {
                heights.push(ix as f32 + 2.0 * iz as f32);
            }
        }
        let field = HeightFieldDesc::new(nx, nz, 1.0, heights).unwrap();
        let terrain = world.add_body(&BodyDesc::fixed(ShapeDesc::HeightField(field)));

        let hit = world
            .cast_ray(Vec3::new(1.5, 20.0, 0.25), -Vec3::Y, 50.0, None)
            .expect("ray should hit the heightfield");

        assert_eq!(hit.body, terrain);
        assert!((hit.point.y - 2.0).abs() < 1e-3, "hit height {}", hit.point.y);
        assert!((hit.distance - 18.0).abs() < 1e-3);
    }

    #[test]
    fn test_raycast_excludes_body() {
        let mut world = RapierWorld::default();
        let floor = ground(&mut world);
        let ball = world.add_body(
            &BodyDesc::dynamic(ShapeDesc::Ball { radius: 1.0 }, 1.0).at(Vec3::new(0.0, 1.0, 0.0)),
        );

        let hit = world.cast_ray(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y, 10.0, Some(ball)).unwrap();
        assert_eq!(hit.body, floor);
        assert!((hit.distance - 1.0).abs() < 1e-4);

        assert!(world.cast_ray(Vec3::ZERO, Vec3::ZERO, 10.0, None).is_none());
    }

    #[test]
    fn test_operations_on_unknown_handle_are_ignored() {
        let mut world = RapierWorld::default();
        let ghost = BodyHandle(999);

        world.apply_impulse(ghost, Vec3::Y);
        world.set_linear_velocity(ghost, Vec3::Y);
        world.set_rotation_locked(ghost, true);
        world.set_angular_damping(ghost, 1.0);
        world.set_transform(ghost, Transform::IDENTITY);

        assert_eq!(world.body_count(), 0);
    }
}
