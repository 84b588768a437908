//! First-person player controller.
//!
//! Drives a dynamic ball body from [`InputState`]: pointer movement turns the
//! view, held keys push the body with impulses, and a downward ray decides
//! whether a jump is allowed. All state is polled once per physics tick.
//!
//! # Angles
//!
//! - `yaw` rotates about +Y; increasing yaw turns left.
//! - `pitch` is measured from straight down: `0` looks at the feet, `π/2` at
//!   the horizon and `π` straight up. It is clamped to `[0, π]` so the view
//!   can never flip over.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec2, Vec3};
use strider_physics::{BodyDesc, BodyHandle, Material, PhysicsWorld, RayHit, ShapeDesc};

use crate::config::ControllerConfig;
use crate::input::InputState;

/// Result of the last grounding raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    pub origin: Vec3,
    pub hit: Option<RayHit>,
    pub grounded: bool,
}

/// What one tick of input did to the body.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlOutcome {
    pub grounded: bool,
    pub jumped: bool,
    /// Movement impulse applied this tick (world space).
    pub impulse: Vec3,
}

/// Binds input state to a physics body.
#[derive(Debug, Clone)]
pub struct Controller {
    config: ControllerConfig,
    body: BodyHandle,
    yaw: f32,
    pitch: f32,
    probe: Option<GroundProbe>,
    sleeping: bool,
    moving: bool,
    jumps: u64,
}

impl Controller {
    /// Register the player body at `position` and take ownership of it.
    pub fn spawn(world: &mut dyn PhysicsWorld, config: ControllerConfig, position: Vec3) -> Self {
        let desc = BodyDesc::dynamic(ShapeDesc::Ball { radius: config.radius }, config.mass)
            .at(position)
            .with_material(Material {
                friction: config.friction,
                restitution: 0.0,
            })
            .with_damping(config.linear_damping, config.idle_angular_damping)
            .with_sleep(config.sleep);
        let body = world.add_body(&desc);

        log::debug!("Spawned player body {:?} at {}", body, position);

        Self {
            config,
            body,
            yaw: 0.0,
            pitch: FRAC_PI_2,
            probe: None,
            sleeping: false,
            moving: false,
            jumps: 0,
        }
    }

    /// Unregister the player body.
    pub fn despawn(self, world: &mut dyn PhysicsWorld) {
        world.remove_body(self.body);
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Set the view directly; pitch is clamped.
    pub fn set_look(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(0.0, PI);
    }

    pub fn last_probe(&self) -> Option<&GroundProbe> {
        self.probe.as_ref()
    }

    /// Sleep state seen at the last tick.
    pub fn is_sleeping(&self) -> bool {
        self.sleeping
    }

    /// Jumps performed since spawn.
    pub fn jump_count(&self) -> u64 {
        self.jumps
    }

    // ========================================================================
    // View
    // ========================================================================

    /// Camera orientation (yaw then pitch). Identity looks along -Z.
    pub fn view_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw) * Quat::from_rotation_x(self.pitch - FRAC_PI_2)
    }

    pub fn look_direction(&self) -> Vec3 {
        self.view_rotation() * Vec3::NEG_Z
    }

    /// Rotation used for movement: yaw only, so looking up or down never
    /// changes walking speed.
    pub fn movement_rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Turn the view by a pointer delta (pixels).
    pub fn apply_look(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO {
            return;
        }
        let sensitivity = self.config.look_sensitivity;
        self.yaw -= delta.x * sensitivity;
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(0.0, PI);
    }

    // ========================================================================
    // Per-tick control
    // ========================================================================

    /// Cast the grounding ray and cache the result.
    pub fn probe_ground(&mut self, world: &dyn PhysicsWorld) -> bool {
        let Some(state) = world.body_state(self.body) else {
            self.probe = None;
            return false;
        };

        let origin = state.position();
        let hit = world.cast_ray(
            origin,
            Vec3::NEG_Y,
            self.config.ground_probe_length,
            Some(self.body),
        );
        let grounded = hit.is_some_and(|h| h.distance < self.config.ground_threshold());

        self.probe = Some(GroundProbe {
            origin,
            hit,
            grounded,
        });
        grounded
    }

    /// Turn this tick's input into forces on the body.
    ///
    /// Consumes the accumulated look delta and any pending jump request. A
    /// jump requested while airborne is dropped, not queued.
    pub fn apply_input_forces(
        &mut self,
        input: &mut InputState,
        world: &mut dyn PhysicsWorld,
        interval: f32,
    ) -> ControlOutcome {
        let mut outcome = ControlOutcome::default();

        // Look
        self.apply_look(input.take_look_delta());

        let Some(state) = world.body_state(self.body) else {
            input.take_jump_request();
            return outcome;
        };
        self.sync_sleep(world, state.sleeping);

        // Movement direction
        let keys = input.movement();
        self.sync_damping(world, keys.any());
        let (forward, right) = keys.axes();
        let local = Vec3::new(right, 0.0, -forward).normalize_or_zero();
        let impulse =
            self.movement_rotation() * local * (self.config.move_acceleration * interval);

        // Jump
        outcome.grounded = self.probe_ground(world);
        if input.take_jump_request() {
            if outcome.grounded {
                let mass = state.mass;
                world.apply_impulse(self.body, Vec3::Y * (self.config.jump_speed * mass));
                outcome.jumped = true;
                self.jumps += 1;
                log::debug!("Jump #{} from {}", self.jumps, state.position());
            } else {
                log::trace!("Jump ignored, not grounded");
            }
        }

        // Move, then cap horizontal speed
        if impulse != Vec3::ZERO {
            world.apply_impulse(self.body, impulse);
            outcome.impulse = impulse;
        }
        self.clamp_horizontal_speed(world);

        outcome
    }

    fn clamp_horizontal_speed(&self, world: &mut dyn PhysicsWorld) {
        let Some(state) = world.body_state(self.body) else {
            return;
        };
        let velocity = state.linear_velocity;
        let horizontal = Vec2::new(velocity.x, velocity.z);
        let max = self.config.max_speed;

        if horizontal.length_squared() > max * max {
            let capped = horizontal.normalize() * max;
            world.set_linear_velocity(self.body, Vec3::new(capped.x, velocity.y, capped.y));
        }
    }

    /// Lock rotation while asleep so the ball does not creep on slopes.
    fn sync_sleep(&mut self, world: &mut dyn PhysicsWorld, sleeping: bool) {
        if sleeping == self.sleeping {
            return;
        }
        self.sleeping = sleeping;
        world.set_rotation_locked(self.body, sleeping);
        log::debug!("Player body {}", if sleeping { "asleep" } else { "awake" });
    }

    fn sync_damping(&mut self, world: &mut dyn PhysicsWorld, moving: bool) {
        if moving == self.moving {
            return;
        }
        self.moving = moving;
        let damping = if moving {
            self.config.moving_angular_damping
        } else {
            self.config.idle_angular_damping
        };
        world.set_angular_damping(self.body, damping);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;
    use strider_physics::{BodyState, RapierWorld, Transform};

    const INTERVAL: f32 = 1.0 / 30.0;

    /// Single-body world that records every call.
    struct RecordingWorld {
        state: Option<BodyState>,
        ground_distance: Option<f32>,
        impulses: Vec<Vec3>,
        rotation_locked: bool,
        angular_damping: f32,
    }

    impl RecordingWorld {
        fn new() -> Self {
            Self {
                state: None,
                ground_distance: Some(2.0),
                impulses: Vec::new(),
                rotation_locked: false,
                angular_damping: 0.0,
            }
        }

        fn velocity(&self) -> Vec3 {
            self.state.unwrap().linear_velocity
        }

        fn set_velocity(&mut self, velocity: Vec3) {
            self.state.as_mut().unwrap().linear_velocity = velocity;
        }

        fn vertical_impulses(&self) -> usize {
            self.impulses.iter().filter(|i| i.y > 0.0).count()
        }
    }

    impl PhysicsWorld for RecordingWorld {
        fn add_body(&mut self, desc: &BodyDesc) -> BodyHandle {
            self.state = Some(BodyState {
                transform: desc.transform,
                linear_velocity: Vec3::ZERO,
                angular_velocity: Vec3::ZERO,
                mass: desc.mass(),
                sleeping: false,
            });
            self.angular_damping = desc.angular_damping;
            BodyHandle(1)
        }

        fn remove_body(&mut self, _handle: BodyHandle) -> bool {
            self.state.take().is_some()
        }

        fn contains_body(&self, _handle: BodyHandle) -> bool {
            self.state.is_some()
        }

        fn body_count(&self) -> usize {
            self.state.is_some() as usize
        }

        fn step(&mut self, _dt: f32) {}

        fn body_state(&self, _handle: BodyHandle) -> Option<BodyState> {
            self.state
        }

        fn apply_impulse(&mut self, _handle: BodyHandle, impulse: Vec3) {
            if let Some(state) = self.state.as_mut() {
                state.linear_velocity += impulse / state.mass;
                state.sleeping = false;
                self.impulses.push(impulse);
            }
        }

        fn set_linear_velocity(&mut self, _handle: BodyHandle, velocity: Vec3) {
            if let Some(state) = self.state.as_mut() {
                state.linear_velocity = velocity;
            }
        }

        fn set_transform(&mut self, _handle: BodyHandle, transform: Transform) {
            if let Some(state) = self.state.as_mut() {
                state.transform = transform;
            }
        }

        fn set_rotation_locked(&mut self, _handle: BodyHandle, locked: bool) {
            self.rotation_locked = locked;
        }

        fn set_angular_damping(&mut self, _handle: BodyHandle, damping: f32) {
            self.angular_damping = damping;
        }

        fn cast_ray(
            &self,
            origin: Vec3,
            _direction: Vec3,
            max_distance: f32,
            _exclude: Option<BodyHandle>,
        ) -> Option<RayHit> {
            let distance = self.ground_distance.filter(|d| *d <= max_distance)?;
            Some(RayHit {
                body: BodyHandle(2),
                distance,
                point: origin - Vec3::Y * distance,
            })
        }
    }

    fn spawn() -> (Controller, RecordingWorld, InputState) {
        let mut world = RecordingWorld::new();
        let controller = Controller::spawn(&mut world, ControllerConfig::default(), Vec3::Y * 2.0);
        (controller, world, InputState::default())
    }

    #[test]
    fn test_pitch_stays_clamped() {
        let (mut controller, mut world, mut input) = spawn();

        for dy in [5000.0, -90000.0, 1.0e6, -3.0e5] {
            // Feed deltas below the glitch threshold repeatedly
            for _ in 0..50 {
                input.pointer_moved(0.0, (dy as f32).signum() * 300.0);
                controller.apply_input_forces(&mut input, &mut world, INTERVAL);
                assert!(
                    (0.0..=PI).contains(&controller.pitch()),
                    "pitch {} out of range",
                    controller.pitch()
                );
            }
        }

        controller.apply_look(Vec2::new(0.0, -1.0e9));
        assert_eq!(controller.pitch(), PI);
        controller.apply_look(Vec2::new(0.0, 1.0e9));
        assert_eq!(controller.pitch(), 0.0);
    }

    #[test]
    fn test_look_consumes_delta() {
        let (mut controller, mut world, mut input) = spawn();

        input.pointer_moved(100.0, 50.0);
        controller.apply_input_forces(&mut input, &mut world, INTERVAL);

        assert!((controller.yaw() + 0.1).abs() < 1e-6);
        assert!((controller.pitch() - (FRAC_PI_2 - 0.05)).abs() < 1e-6);
        assert_eq!(input.look_delta(), Vec2::ZERO);

        let yaw = controller.yaw();
        controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert_eq!(controller.yaw(), yaw);
    }

    #[test]
    fn test_view_directions() {
        let (mut controller, _, _) = spawn();

        assert!((controller.look_direction() - Vec3::NEG_Z).length() < 1e-6);

        controller.set_look(0.0, PI);
        assert!((controller.look_direction() - Vec3::Y).length() < 1e-6);

        controller.set_look(0.0, 0.0);
        assert!((controller.look_direction() - Vec3::NEG_Y).length() < 1e-6);

        controller.set_look(FRAC_PI_2, FRAC_PI_2);
        assert!((controller.look_direction() - Vec3::NEG_X).length() < 1e-6);
    }

    #[test]
    fn test_movement_uses_yaw_only() {
        let (mut controller, mut world, mut input) = spawn();
        input.key_down(Key::Forward, false);

        let level = controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        let expected = 1000.0 * INTERVAL;
        assert!((level.impulse - Vec3::new(0.0, 0.0, -expected)).length() < 1e-4);

        // Looking up changes nothing about the push
        world.set_velocity(Vec3::ZERO);
        controller.set_look(0.0, 2.8);
        let looking_up = controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert!((looking_up.impulse - level.impulse).length() < 1e-4);

        // Turning left a quarter turn pushes along -X
        world.set_velocity(Vec3::ZERO);
        controller.set_look(FRAC_PI_2, FRAC_PI_2);
        let turned = controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert!((turned.impulse - Vec3::new(-expected, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn test_diagonal_movement_is_normalized() {
        let (mut controller, mut world, mut input) = spawn();
        input.key_down(Key::Forward, false);
        input.key_down(Key::Right, false);

        let outcome = controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert!((outcome.impulse.length() - 1000.0 * INTERVAL).abs() < 1e-3);
        assert!(outcome.impulse.x > 0.0 && outcome.impulse.z < 0.0);
    }

    #[test]
    fn test_grounded_jump_fires_once_per_press() {
        let (mut controller, mut world, mut input) = spawn();

        input.key_down(Key::Jump, false);
        let first = controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert!(first.grounded);
        assert!(first.jumped);
        assert_eq!(world.impulses, vec![Vec3::Y * 50.0]);

        // Key stays held: repeats and later ticks never jump again
        for _ in 0..10 {
            input.key_down(Key::Jump, true);
            world.set_velocity(Vec3::ZERO);
            let outcome = controller.apply_input_forces(&mut input, &mut world, INTERVAL);
            assert!(!outcome.jumped);
        }
        assert_eq!(world.vertical_impulses(), 1);

        input.key_up(Key::Jump);
        input.key_down(Key::Jump, false);
        controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert_eq!(world.vertical_impulses(), 2);
        assert_eq!(controller.jump_count(), 2);
    }

    #[test]
    fn test_airborne_jump_is_dropped() {
        let (mut controller, mut world, mut input) = spawn();
        world.ground_distance = Some(6.0);

        input.key_down(Key::Jump, false);
        let outcome = controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert!(!outcome.grounded);
        assert!(!outcome.jumped);
        assert!(!input.jump_requested());

        // Landing later does not replay the request
        world.ground_distance = Some(2.0);
        let landed = controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert!(landed.grounded);
        assert!(!landed.jumped);
        assert!(world.impulses.is_empty());
    }

    #[test]
    fn test_grounding_threshold() {
        let (mut controller, mut world, _) = spawn();

        world.ground_distance = Some(2.49);
        assert!(controller.probe_ground(&world));

        world.ground_distance = Some(2.51);
        assert!(!controller.probe_ground(&world));
        assert!(controller.last_probe().unwrap().hit.is_some());

        world.ground_distance = None;
        assert!(!controller.probe_ground(&world));
        assert!(controller.last_probe().unwrap().hit.is_none());
    }

    #[test]
    fn test_only_horizontal_speed_is_clamped() {
        let (mut controller, mut world, mut input) = spawn();
        world.set_velocity(Vec3::new(30.0, -20.0, 40.0));

        controller.apply_input_forces(&mut input, &mut world, INTERVAL);

        let v = world.velocity();
        assert!((Vec2::new(v.x, v.z).length() - 5.0).abs() < 1e-4);
        assert!((v.x - 3.0).abs() < 1e-4 && (v.z - 4.0).abs() < 1e-4);
        assert_eq!(v.y, -20.0);
    }

    #[test]
    fn test_slow_body_is_not_touched() {
        let (mut controller, mut world, mut input) = spawn();
        world.set_velocity(Vec3::new(1.0, 8.0, -1.0));

        controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert_eq!(world.velocity(), Vec3::new(1.0, 8.0, -1.0));
    }

    #[test]
    fn test_sleep_locks_rotation() {
        let (mut controller, mut world, mut input) = spawn();

        world.state.as_mut().unwrap().sleeping = true;
        controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert!(controller.is_sleeping());
        assert!(world.rotation_locked);

        world.state.as_mut().unwrap().sleeping = false;
        controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert!(!controller.is_sleeping());
        assert!(!world.rotation_locked);
    }

    #[test]
    fn test_angular_damping_follows_movement() {
        let (mut controller, mut world, mut input) = spawn();
        assert_eq!(world.angular_damping, 1.0);

        input.key_down(Key::Left, false);
        controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert_eq!(world.angular_damping, 0.75);

        input.key_up(Key::Left);
        controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert_eq!(world.angular_damping, 1.0);
    }

    #[test]
    fn test_jump_on_real_ground() {
        let mut world = RapierWorld::default();
        world.add_body(
            &BodyDesc::fixed(ShapeDesc::Cuboid {
                half_extents: Vec3::new(50.0, 0.5, 50.0),
            })
            .at(Vec3::new(0.0, -0.5, 0.0)),
        );
        let mut controller =
            Controller::spawn(&mut world, ControllerConfig::default(), Vec3::new(0.0, 2.5, 0.0));
        let mut input = InputState::default();

        for _ in 0..60 {
            controller.apply_input_forces(&mut input, &mut world, INTERVAL);
            world.step(INTERVAL);
        }
        assert!(controller.probe_ground(&world), "player should have settled");

        input.key_down(Key::Jump, false);
        let outcome = controller.apply_input_forces(&mut input, &mut world, INTERVAL);
        assert!(outcome.jumped);

        let vy = world.body_state(controller.body()).unwrap().linear_velocity.y;
        assert!(vy > 4.0, "expected upward velocity, got {}", vy);

        world.step(INTERVAL);
        world.step(INTERVAL);
        let y = world.body_state(controller.body()).unwrap().position().y;
        assert!(y > 2.1, "player should leave the ground, y={}", y);
    }
}
