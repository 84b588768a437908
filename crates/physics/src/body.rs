//! Body, shape and transform descriptions.
//!
//! These are plain data types shared by every [`PhysicsWorld`](crate::PhysicsWorld)
//! implementation. Nothing in here talks to a solver.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque handle to a body registered with a physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u64);

/// Position and orientation of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// Blend towards `target` by `alpha`.
    ///
    /// Translation is linearly interpolated and rotation spherically
    /// interpolated. Both endpoints are returned exactly: `alpha <= 0` yields
    /// `self` and `alpha >= 1` yields `target`, with no floating-point drift.
    pub fn blend(&self, target: &Transform, alpha: f32) -> Transform {
        if alpha >= 1.0 {
            return *target;
        }
        if alpha <= 0.0 || alpha.is_nan() {
            return *self;
        }
        Transform {
            translation: self.translation.lerp(target.translation, alpha),
            rotation: self.rotation.slerp(target.rotation, alpha),
        }
    }
}

/// Errors raised while describing collision shapes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ShapeError {
    #[error("heightfield needs at least 2x2 samples, got {x}x{z}")]
    TooFewSamples { x: usize, z: usize },

    #[error("heightfield expects {expected} heights, got {actual}")]
    SampleCount { expected: usize, actual: usize },

    #[error("invalid element size: {0}")]
    ElementSize(f32),

    #[error("non-finite height at sample {0}")]
    NonFiniteHeight(usize),
}

/// A rectangular grid of elevations used as a static collision surface.
///
/// Samples are stored row-major with `x` outer and `z` inner, so the height at
/// lattice point `(ix, iz)` lives at `ix * samples_z + iz`. The local origin is
/// the `(0, 0)` corner and the surface extends along `+x` and `+z`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightFieldDesc {
    samples_x: usize,
    samples_z: usize,
    element_size: f32,
    heights: Vec<f32>,
}

impl HeightFieldDesc {
    pub fn new(
        samples_x: usize,
        samples_z: usize,
        element_size: f32,
        heights: Vec<f32>,
    ) -> Result<Self, ShapeError> {
        if samples_x < 2 || samples_z < 2 {
            return Err(ShapeError::TooFewSamples {
                x: samples_x,
                z: samples_z,
            });
        }
        if !(element_size.is_finite() && element_size > 0.0) {
            return Err(ShapeError::ElementSize(element_size));
        }
        let expected = samples_x * samples_z;
        if heights.len() != expected {
            return Err(ShapeError::SampleCount {
                expected,
                actual: heights.len(),
            });
        }
        if let Some(index) = heights.iter().position(|h| !h.is_finite()) {
            return Err(ShapeError::NonFiniteHeight(index));
        }

        Ok(Self {
            samples_x,
            samples_z,
            element_size,
            heights,
        })
    }

    pub fn samples_x(&self) -> usize {
        self.samples_x
    }

    pub fn samples_z(&self) -> usize {
        self.samples_z
    }

    pub fn element_size(&self) -> f32 {
        self.element_size
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Height at lattice point `(ix, iz)`.
    pub fn height(&self, ix: usize, iz: usize) -> f32 {
        self.heights[ix * self.samples_z + iz]
    }

    /// World-space length along `x`.
    pub fn extent_x(&self) -> f32 {
        (self.samples_x - 1) as f32 * self.element_size
    }

    /// World-space length along `z`.
    pub fn extent_z(&self) -> f32 {
        (self.samples_z - 1) as f32 * self.element_size
    }
}

/// Collision shape attached to a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeDesc {
    Ball { radius: f32 },
    Cuboid { half_extents: Vec3 },
    HeightField(HeightFieldDesc),
}

/// Whether a body moves under simulation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves; infinite mass.
    Static,
    /// Simulated with the given total mass (kg).
    Dynamic { mass: f32 },
}

/// Surface response coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

/// Sleep behaviour for dynamic bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepConfig {
    /// Whether the body may fall asleep at all.
    pub enabled: bool,

    /// Speed below which the body is considered at rest (m/s).
    pub linear_threshold: f32,

    /// Time the body must stay at rest before sleeping (s).
    pub time_until_sleep: f32,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            linear_threshold: 0.5,
            time_until_sleep: 0.1,
        }
    }
}

/// Everything needed to register a body with a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: ShapeDesc,
    pub transform: Transform,
    pub material: Material,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub sleep: SleepConfig,
    pub lock_rotations: bool,
}

impl BodyDesc {
    /// A simulated body with the given mass.
    pub fn dynamic(shape: ShapeDesc, mass: f32) -> Self {
        Self {
            kind: BodyKind::Dynamic { mass },
            shape,
            transform: Transform::IDENTITY,
            material: Material::default(),
            linear_damping: 0.0,
            angular_damping: 0.0,
            sleep: SleepConfig::default(),
            lock_rotations: false,
        }
    }

    /// A body that never moves.
    pub fn fixed(shape: ShapeDesc) -> Self {
        Self {
            kind: BodyKind::Static,
            ..Self::dynamic(shape, 0.0)
        }
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.transform.translation = translation;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_sleep(mut self, sleep: SleepConfig) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, BodyKind::Dynamic { .. })
    }

    pub fn mass(&self) -> f32 {
        match self.kind {
            BodyKind::Static => 0.0,
            BodyKind::Dynamic { mass } => mass,
        }
    }
}

/// Snapshot of a body read back from a world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub transform: Transform,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Total mass (kg); zero for static bodies.
    pub mass: f32,
    pub sleeping: bool,
}

impl BodyState {
    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }
}

/// Closest hit of a ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub body: BodyHandle,
    /// Distance from the ray origin along the normalized direction.
    pub distance: f32,
    pub point: Vec3,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_blend_endpoints_are_exact() {
        let a = Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.3));
        let b = Transform::new(Vec3::new(-4.0, 0.5, 9.0), Quat::from_rotation_x(1.1));

        assert_eq!(a.blend(&b, 0.0), a);
        assert_eq!(a.blend(&b, 1.0), b);
        assert_eq!(a.blend(&b, 1.5), b);
    }

    #[test]
    fn test_blend_midpoint() {
        let a = Transform::from_translation(Vec3::ZERO);
        let b = Transform::new(Vec3::new(2.0, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_2));

        let mid = a.blend(&b, 0.5);
        assert!((mid.translation - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-6);

        let expected = Quat::from_rotation_y(FRAC_PI_2 * 0.5);
        assert!(
            mid.rotation.angle_between(expected) < 1e-4,
            "rotation should be halfway, got {:?}",
            mid.rotation
        );
    }

    #[test]
    fn test_heightfield_indexing() {
        // 3 samples along x, 2 along z
        let hf = HeightFieldDesc::new(3, 2, 0.5, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        assert_eq!(hf.height(0, 1), 1.0);
        assert_eq!(hf.height(1, 0), 2.0);
        assert_eq!(hf.height(2, 1), 5.0);
        assert_eq!(hf.extent_x(), 1.0);
        assert_eq!(hf.extent_z(), 0.5);
    }

    #[test]
    fn test_heightfield_rejects_bad_input() {
        assert_eq!(
            HeightFieldDesc::new(1, 4, 1.0, vec![0.0; 4]),
            Err(ShapeError::TooFewSamples { x: 1, z: 4 })
        );
        assert_eq!(
            HeightFieldDesc::new(2, 2, 1.0, vec![0.0; 3]),
            Err(ShapeError::SampleCount {
                expected: 4,
                actual: 3
            })
        );
        assert!(matches!(
            HeightFieldDesc::new(2, 2, 0.0, vec![0.0; 4]),
            Err(ShapeError::ElementSize(_))
        ));
        assert_eq!(
            HeightFieldDesc::new(2, 2, 1.0, vec![0.0, f32::NAN, 0.0, 0.0]),
            Err(ShapeError::NonFiniteHeight(1))
        );
    }

    #[test]
    fn test_fixed_body_has_no_mass() {
        let desc = BodyDesc::fixed(ShapeDesc::Ball { radius: 1.0 });
        assert!(!desc.is_dynamic());
        assert_eq!(desc.mass(), 0.0);

        let desc = BodyDesc::dynamic(ShapeDesc::Ball { radius: 1.0 }, 10.0).at(Vec3::Y);
        assert!(desc.is_dynamic());
        assert_eq!(desc.mass(), 10.0);
        assert_eq!(desc.transform.translation, Vec3::Y);
    }
}
