//! Simulation and controller configuration.
//!
//! All tunables live here with their defaults. Configs deserialize from JSON
//! with every field optional, and are validated once at startup.

use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use strider_physics::{SleepConfig, DEFAULT_GRAVITY};
use strider_world::{TerrainConfig, TerrainError};
use thiserror::Error;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid terrain config: {0}")]
    Terrain(#[from] TerrainError),

    #[error("physics tick rate must be positive, got {0}")]
    TickRate(f32),

    #[error("max_catch_up_ticks must be at least 1")]
    CatchUp,

    #[error("viewport must have a positive size, got {width}x{height}")]
    Viewport { width: f32, height: f32 },

    #[error("invalid controller setting {field}: {value}")]
    Controller { field: &'static str, value: f32 },
}

/// Size of the view the pointer moves over (pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

/// Configuration for the player controller.
///
/// Metric units (meters, seconds, kilograms) unless noted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // ========================================================================
    // Body
    // ========================================================================
    /// Radius of the player's ball collider.
    pub radius: f32,

    /// Player mass (kg).
    pub mass: f32,

    /// Ground friction coefficient of the player collider.
    pub friction: f32,

    /// Linear damping applied by the solver.
    pub linear_damping: f32,

    /// Angular damping while a movement key is held.
    pub moving_angular_damping: f32,

    /// Angular damping while idle.
    pub idle_angular_damping: f32,

    /// When the body is allowed to fall asleep.
    pub sleep: SleepConfig,

    // ========================================================================
    // Look
    // ========================================================================
    /// Radians of rotation per pixel of pointer movement.
    pub look_sensitivity: f32,

    // ========================================================================
    // Movement
    // ========================================================================
    /// Impulse per second of held movement key (N·s/s).
    pub move_acceleration: f32,

    /// Horizontal speed cap (m/s). Vertical speed is never capped.
    pub max_speed: f32,

    /// Upward velocity change of a jump (m/s); the impulse is this times mass.
    pub jump_speed: f32,

    // ========================================================================
    // Grounding
    // ========================================================================
    /// Ground counts as touching when the probe hit is closer than
    /// `radius * ground_probe_factor`.
    pub ground_probe_factor: f32,

    /// Length of the downward grounding ray.
    pub ground_probe_length: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            mass: 10.0,
            friction: 0.05,
            linear_damping: 0.0,
            moving_angular_damping: 0.75,
            idle_angular_damping: 1.0,
            sleep: SleepConfig {
                enabled: true,
                linear_threshold: 0.5,
                time_until_sleep: 0.1,
            },

            look_sensitivity: 0.001,

            move_acceleration: 1000.0,
            max_speed: 5.0,
            jump_speed: 5.0,

            ground_probe_factor: 1.25,
            ground_probe_length: 10.0,
        }
    }
}

impl ControllerConfig {
    /// Distance under which the probe reports ground.
    pub fn ground_threshold(&self) -> f32 {
        self.radius * self.ground_probe_factor
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("radius", self.radius),
            ("mass", self.mass),
            ("look_sensitivity", self.look_sensitivity),
            ("ground_probe_factor", self.ground_probe_factor),
            ("ground_probe_length", self.ground_probe_length),
        ];
        let non_negative = [
            ("friction", self.friction),
            ("linear_damping", self.linear_damping),
            ("moving_angular_damping", self.moving_angular_damping),
            ("idle_angular_damping", self.idle_angular_damping),
            ("move_acceleration", self.move_acceleration),
            ("max_speed", self.max_speed),
            ("jump_speed", self.jump_speed),
        ];

        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Controller { field, value });
            }
        }
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Controller { field, value });
            }
        }
        Ok(())
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Physics ticks per second.
    pub physics_tick_rate: f32,

    /// Render passes per second; zero or negative means every display tick.
    pub render_tick_rate: f32,

    /// Most physics ticks run by a single clock advance.
    pub max_catch_up_ticks: u32,

    /// World gravity (m/s²).
    pub gravity: Vec3,

    /// Pointer viewport, used to reject glitched pointer deltas.
    pub viewport: Viewport,

    /// Player spawn position on the horizontal (X/Z) plane.
    pub spawn: Vec2,

    /// Height above the terrain surface the player spawns at.
    pub spawn_clearance: f32,

    pub terrain: TerrainConfig,

    pub controller: ControllerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            physics_tick_rate: 30.0,
            render_tick_rate: -1.0,
            max_catch_up_ticks: 5,
            gravity: DEFAULT_GRAVITY,
            viewport: Viewport::default(),
            spawn: Vec2::ZERO,
            spawn_clearance: 4.0,
            terrain: TerrainConfig::default(),
            controller: ControllerConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Fixed physics step in seconds.
    pub fn physics_interval(&self) -> f32 {
        1.0 / self.physics_tick_rate
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.physics_tick_rate.is_finite() && self.physics_tick_rate > 0.0) {
            return Err(ConfigError::TickRate(self.physics_tick_rate));
        }
        if self.max_catch_up_ticks == 0 {
            return Err(ConfigError::CatchUp);
        }
        let Viewport { width, height } = self.viewport;
        if !(width > 0.0 && height > 0.0) {
            return Err(ConfigError::Viewport { width, height });
        }
        self.terrain.validate()?;
        self.controller.validate()?;
        Ok(())
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
