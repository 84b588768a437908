//! Strider Game
//!
//! The real-time loop on top of the physics and terrain crates.
//!
//! # Architecture
//!
//! - **Clock**: fixed-step accumulator, render throttle and wall-clock timer
//! - **Input**: key and pointer state fed in by the host
//! - **Controller**: turns input into impulses on the player's ball body
//! - **Interpolation**: previous/current snapshots blended for rendering
//! - **Prop**: extra physics bodies with render nodes
//! - **Frame**: owns all of the above and runs one display tick at a time
//!
//! # Tick order
//!
//! Every physics tick captures the previous snapshots, applies player input,
//! steps the world once by the fixed interval, then captures the current
//! snapshots. Terrain streaming runs after the ticks of a display tick, and
//! rendering last.

pub mod clock;
pub mod config;
pub mod controller;
pub mod frame;
pub mod input;
pub mod interpolation;
pub mod prop;

pub use clock::{ClockAdvance, FrameTimer, RenderThrottle, SimulationClock};
pub use config::{ConfigError, ControllerConfig, SimulationConfig, Viewport};
pub use controller::{ControlOutcome, Controller, GroundProbe};
pub use frame::{Frame, FrameStats};
pub use input::{InputState, Key, MovementKeys};
pub use interpolation::Interpolated;
pub use prop::{Prop, PropDesc};
