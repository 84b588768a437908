//! The per-display-tick driver.
//!
//! A [`Frame`] owns every piece of simulation state and runs one display tick
//! at a time:
//!
//! ```text
//! real delta ─► SimulationClock ─► N × { capture previous
//!                                        Controller::apply_input_forces
//!                                        PhysicsWorld::step
//!                                        capture current }
//!            ─► terrain streaming
//!            ─► RenderThrottle ─► interpolate + RenderGroup::place
//! ```
//!
//! Because the frame owns the physics world, terrain can only change between
//! steps, never during one.

use glam::Vec3;
use strider_physics::{PhysicsWorld, RapierWorld, Transform};
use strider_world::{Chunk, HeadlessScene, NodeId, RenderGroup, TerrainGrid};

use crate::clock::{FrameTimer, RenderThrottle, SimulationClock};
use crate::config::{ConfigError, SimulationConfig};
use crate::controller::{ControlOutcome, Controller};
use crate::input::InputState;
use crate::interpolation::Interpolated;
use crate::prop::{Prop, PropDesc};

/// What one display tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    /// Display ticks run so far, including this one.
    pub frame: u64,
    pub ticks: u32,
    pub alpha: f32,
    pub rendered: bool,
    /// Simulated time discarded by the catch-up cap (s).
    pub dropped: f32,
    pub chunks_added: usize,
    pub chunks_removed: usize,
    /// Controller result of the last physics tick, if any ran.
    pub control: Option<ControlOutcome>,
}

/// Composition root of the simulation.
pub struct Frame<W: PhysicsWorld, R: RenderGroup> {
    config: SimulationConfig,
    clock: SimulationClock,
    timer: FrameTimer,
    throttle: RenderThrottle,
    world: W,
    scene: R,
    terrain: TerrainGrid,
    input: InputState,
    player: Controller,
    player_node: NodeId,
    player_motion: Interpolated,
    props: Vec<Prop>,
    next_node: u64,
    frame: u64,
    visible: bool,
}

impl Frame<RapierWorld, HeadlessScene> {
    /// A frame over a Rapier world with no renderer attached.
    pub fn headless(config: SimulationConfig) -> Result<Self, ConfigError> {
        let world = RapierWorld::new(config.gravity);
        Self::new(config, world, HeadlessScene::new())
    }
}

impl<W: PhysicsWorld, R: RenderGroup> Frame<W, R> {
    /// Validate `config`, load terrain around the spawn point and spawn the
    /// player above it.
    pub fn new(config: SimulationConfig, mut world: W, mut scene: R) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut terrain = TerrainGrid::new(config.terrain.clone())?;
        let (x, z) = (config.spawn.x, config.spawn.y);
        let ground = Vec3::new(x, 0.0, z);

        terrain.add_chunk(&mut world, &mut scene, ground);
        if let Some(radius) = config.terrain.stream_radius {
            while terrain.stream_around(&mut world, &mut scene, ground, radius).pending > 0 {}
        }

        let spawn = Vec3::new(x, terrain.height_at(x, z) + config.spawn_clearance, z);
        let player = Controller::spawn(&mut world, config.controller.clone(), spawn);
        let player_motion = Interpolated::new(Transform::from_translation(spawn));

        log::info!(
            "Simulation ready: {} chunks, player at {}",
            terrain.len(),
            spawn
        );

        Ok(Self {
            clock: SimulationClock::new(config.physics_tick_rate, config.max_catch_up_ticks),
            timer: FrameTimer::new(),
            throttle: RenderThrottle::new(config.render_tick_rate),
            input: InputState::new(config.viewport),
            config,
            world,
            scene,
            terrain,
            player,
            player_node: NodeId(0),
            player_motion,
            props: Vec::new(),
            next_node: 1,
            frame: 0,
            visible: true,
        })
    }

    // ========================================================================
    // Display tick
    // ========================================================================

    /// Run one display tick using wall-clock time.
    pub fn tick(&mut self) -> FrameStats {
        let delta = self.timer.poll();
        self.advance(delta)
    }

    /// Run one display tick with an explicit real-time delta (s).
    pub fn advance(&mut self, real_delta: f32) -> FrameStats {
        self.frame += 1;
        let step = self.clock.advance(real_delta);

        let mut stats = FrameStats {
            frame: self.frame,
            ticks: step.ticks,
            alpha: step.alpha,
            dropped: step.dropped,
            ..Default::default()
        };

        for _ in 0..step.ticks {
            stats.control = Some(self.physics_tick());
        }

        if let Some(radius) = self.config.terrain.stream_radius {
            let center = self.player_position();
            let streamed = self
                .terrain
                .stream_around(&mut self.world, &mut self.scene, center, radius);
            stats.chunks_added = streamed.added;
            stats.chunks_removed = streamed.removed;
        }

        if self.visible && self.throttle.admit(real_delta).is_some() {
            self.render(step.alpha);
            stats.rendered = true;
        }

        stats
    }

    fn physics_tick(&mut self) -> ControlOutcome {
        let interval = self.clock.interval();

        self.capture(Interpolated::capture_previous);
        let outcome = self
            .player
            .apply_input_forces(&mut self.input, &mut self.world, interval);
        self.world.step(interval);
        self.capture(Interpolated::capture_current);

        outcome
    }

    fn capture(&mut self, record: fn(&mut Interpolated, Transform)) {
        // The ball's spin never reaches the camera, so only its position is kept.
        if let Some(state) = self.world.body_state(self.player.body()) {
            record(
                &mut self.player_motion,
                Transform::from_translation(state.position()),
            );
        }
        for prop in self.props.iter_mut().filter(|p| p.is_dynamic()) {
            if let Some(state) = self.world.body_state(prop.body()) {
                record(prop.motion_mut(), state.transform);
            }
        }
    }

    fn render(&mut self, alpha: f32) {
        let body = self.player_motion.update(alpha);
        self.scene.place(
            self.player_node,
            Transform::new(body.translation, self.player.view_rotation()),
        );

        for prop in self.props.iter_mut().filter(|p| p.is_dynamic()) {
            let transform = prop.motion_mut().update(alpha);
            self.scene.place(prop.node(), transform);
        }
    }

    // ========================================================================
    // Visibility
    // ========================================================================

    /// Pause when hidden, resume when shown again.
    ///
    /// Hiding releases all held keys so nothing stays pressed while the host
    /// is not delivering key-up events.
    pub fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;

        if visible {
            self.clock.resume();
            self.timer.start();
        } else {
            self.clock.pause();
            self.timer.stop();
            self.input.release_all();
        }
        log::debug!("Simulation {}", if visible { "resumed" } else { "paused" });
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    // ========================================================================
    // Entities
    // ========================================================================

    /// Spawn a prop and return its render node.
    pub fn spawn_prop(&mut self, desc: &PropDesc) -> NodeId {
        let node = NodeId(self.next_node);
        self.next_node += 1;

        let prop = Prop::spawn(&mut self.world, node, desc);
        self.scene.place(node, desc.body.transform);
        self.props.push(prop);
        node
    }

    pub fn prop(&self, node: NodeId) -> Option<&Prop> {
        self.props.iter().find(|p| p.node() == node)
    }

    /// Teleport a prop, body and snapshots alike. Returns `false` for
    /// unknown nodes.
    pub fn set_prop_transform(&mut self, node: NodeId, transform: Transform) -> bool {
        let Some(prop) = self.props.iter_mut().find(|p| p.node() == node) else {
            return false;
        };
        prop.set_transform(&mut self.world, transform);
        self.scene.place(node, transform);
        true
    }

    /// Remove a prop, its body and its render node. Unknown nodes are ignored.
    pub fn remove_prop(&mut self, node: NodeId) -> bool {
        let Some(index) = self.props.iter().position(|p| p.node() == node) else {
            return false;
        };
        let prop = self.props.swap_remove(index);
        self.world.remove_body(prop.body());
        self.scene.remove(node);
        true
    }

    pub fn props(&self) -> &[Prop] {
        &self.props
    }

    // ========================================================================
    // Terrain
    // ========================================================================

    pub fn add_chunk(&mut self, position: Vec3) -> bool {
        self.terrain
            .add_chunk(&mut self.world, &mut self.scene, position)
    }

    pub fn remove_chunk(&mut self, position: Vec3) -> Option<Chunk> {
        self.terrain
            .remove_chunk(&mut self.world, &mut self.scene, position)
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn timer_mut(&mut self) -> &mut FrameTimer {
        &mut self.timer
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn controller(&self) -> &Controller {
        &self.player
    }

    pub fn player_node(&self) -> NodeId {
        self.player_node
    }

    /// Current physics position of the player body.
    pub fn player_position(&self) -> Vec3 {
        self.world
            .body_state(self.player.body())
            .map(|s| s.position())
            .unwrap_or(self.player_motion.current().translation)
    }

    /// Interpolated player snapshots.
    pub fn player_motion(&self) -> &Interpolated {
        &self.player_motion
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn scene(&self) -> &R {
        &self.scene
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use strider_world::ChunkCoord;

    fn small_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.terrain.segments = 8;
        config
    }

    #[test]
    fn test_new_loads_terrain_and_spawns_above_it() {
        let frame = Frame::headless(small_config()).unwrap();

        assert_eq!(frame.terrain().len(), 9);
        assert_eq!(frame.scene().terrain_count(), 9);
        // Terrain bodies plus the player
        assert_eq!(frame.world().body_count(), 10);

        let ground = frame.terrain().height_at(0.0, 0.0);
        assert!((frame.player_position().y - (ground + 4.0)).abs() < 1e-4);
    }

    #[test]
    fn test_streaming_disabled_loads_spawn_chunk_only() {
        let mut config = small_config();
        config.terrain.stream_radius = None;
        config.spawn = glam::Vec2::new(-3.0, 20.0);

        let frame = Frame::headless(config).unwrap();
        assert_eq!(frame.terrain().len(), 1);
        assert!(frame
            .terrain()
            .get_chunk(Vec3::new(-3.0, 0.0, 20.0))
            .is_some_and(|c| c.coord() == ChunkCoord::new(-1, 2)));
    }

    #[test]
    fn test_sub_interval_frame_interpolates() {
        let mut frame = Frame::headless(small_config()).unwrap();

        let stats = frame.advance(0.01);
        assert_eq!(stats.ticks, 0);
        assert!(stats.rendered);
        assert!((stats.alpha - 0.3).abs() < 1e-4);
        assert!(frame.scene().node(frame.player_node()).is_some());
    }

    #[test]
    fn test_tick_frame_renders_exact_physics_state() {
        let mut frame = Frame::headless(small_config()).unwrap();

        let stats = frame.advance(0.05);
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.alpha, 1.0);

        let placed = frame.scene().node(frame.player_node()).unwrap();
        assert_eq!(placed.translation, frame.player_position());
        assert_eq!(placed.rotation, frame.controller().view_rotation());
    }

    #[test]
    fn test_catch_up_cap_applies() {
        let mut frame = Frame::headless(small_config()).unwrap();

        let stats = frame.advance(30.0);
        assert_eq!(stats.ticks, 5);
        assert!(stats.dropped > 29.0);
    }

    #[test]
    fn test_hidden_frame_is_paused() {
        let mut frame = Frame::headless(small_config()).unwrap();
        frame.input_mut().key_down(crate::input::Key::Forward, false);

        frame.set_visible(false);
        let stats = frame.advance(1.0);
        assert_eq!(stats.ticks, 0);
        assert!(!stats.rendered);
        assert!(!frame.input().has_movement());

        frame.set_visible(true);
        assert_eq!(frame.advance(0.04).ticks, 1);
    }

    #[test]
    fn test_render_throttle_skips_frames() {
        let mut config = small_config();
        config.render_tick_rate = 10.0;
        let mut frame = Frame::headless(config).unwrap();

        assert!(!frame.advance(0.05).rendered);
        assert!(frame.advance(0.06).rendered);
    }

    #[test]
    fn test_props_fall_and_are_placed() {
        let mut frame = Frame::headless(small_config()).unwrap();
        let start = Vec3::new(3.0, 20.0, 3.0);
        let node = frame.spawn_prop(&PropDesc::cube().at(start));

        for _ in 0..30 {
            frame.advance(1.0 / 60.0);
        }

        let placed = frame.scene().node(node).unwrap();
        assert!(placed.translation.y < start.y, "cube should fall");
        assert_eq!(frame.world().body_count(), 11);

        assert!(frame.remove_prop(node));
        assert!(!frame.remove_prop(node));
        assert_eq!(frame.world().body_count(), 10);
        assert!(frame.scene().node(node).is_none(), "removed prop is still drawn");

        // Later render passes do not bring it back
        frame.advance(1.0 / 30.0);
        assert!(frame.scene().node(node).is_none());
        assert!(frame.prop(node).is_none());
    }

    #[test]
    fn test_prop_teleport() {
        let mut frame = Frame::headless(small_config()).unwrap();
        let node = frame.spawn_prop(&PropDesc::ball(1.0, 1.0).at(Vec3::new(0.0, 30.0, 0.0)));

        let target = Transform::from_translation(Vec3::new(5.0, 40.0, 5.0));
        assert!(frame.set_prop_transform(node, target));
        assert!(!frame.set_prop_transform(NodeId(999), target));

        let prop = frame.prop(node).unwrap();
        assert_eq!(prop.motion().previous(), target);
        assert_eq!(prop.motion().current(), target);
        assert_eq!(frame.scene().node(node), Some(target));

        let body = frame.world().body_state(prop.body()).unwrap();
        assert_eq!(body.position(), target.translation);
    }

    #[test]
    fn test_player_snapshots_carry_position_only() {
        let mut frame = Frame::headless(small_config()).unwrap();
        frame.input_mut().key_down(crate::input::Key::Right, false);

        for _ in 0..20 {
            frame.advance(1.0 / 30.0);
        }

        let motion = frame.player_motion();
        assert_eq!(motion.previous().rotation, glam::Quat::IDENTITY);
        assert_eq!(motion.current().rotation, glam::Quat::IDENTITY);
        assert_eq!(motion.current().translation, frame.player_position());
    }

    #[test]
    fn test_player_walks_forward_over_terrain() {
        let mut frame = Frame::headless(small_config()).unwrap();

        // Land first
        for _ in 0..90 {
            frame.advance(1.0 / 60.0);
        }
        let start = frame.player_position();

        frame.input_mut().key_down(crate::input::Key::Forward, false);
        for _ in 0..120 {
            let stats = frame.advance(1.0 / 60.0);
            if let Some(control) = stats.control {
                assert!(control.impulse.z < 0.0);
            }
        }

        let end = frame.player_position();
        assert!(start.z - end.z > 1.0, "moved from {} to {}", start, end);
        assert!(frame.terrain().get_chunk(end).is_some(), "terrain follows the player");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = small_config();
        config.physics_tick_rate = -5.0;
        assert!(matches!(
            Frame::headless(config),
            Err(ConfigError::TickRate(_))
        ));
    }
}
