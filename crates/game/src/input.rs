//! Player input state.
//!
//! The host feeds raw device events in (key codes, pointer deltas); the
//! controller polls the resulting state once per physics tick. Nothing in
//! here reads an OS or browser API.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::Viewport;

/// Logical keys the controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Forward,
    Backward,
    Left,
    Right,
    Jump,
}

impl Key {
    /// Map a physical key code (`"KeyW"`, `"ArrowUp"`, `"Space"`, ...) to a key.
    ///
    /// WASD and the arrow keys are equivalent.
    pub fn from_code(code: &str) -> Option<Key> {
        match code {
            "KeyW" | "ArrowUp" => Some(Key::Forward),
            "KeyS" | "ArrowDown" => Some(Key::Backward),
            "KeyA" | "ArrowLeft" => Some(Key::Left),
            "KeyD" | "ArrowRight" => Some(Key::Right),
            "Space" => Some(Key::Jump),
            _ => None,
        }
    }
}

/// Movement key states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementKeys {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementKeys {
    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// `(forward, right)` axes in `[-1, 1]`, opposing keys cancel.
    pub fn axes(&self) -> (f32, f32) {
        let axis = |pos: bool, neg: bool| pos as i8 as f32 - neg as i8 as f32;
        (
            axis(self.forward, self.backward),
            axis(self.right, self.left),
        )
    }
}

/// Accumulated device state between physics ticks.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    movement: MovementKeys,
    jump_held: bool,
    jump_requested: bool,
    look_delta: Vec2,
    last_accepted: Vec2,
    viewport: Viewport,
}

impl InputState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Default::default()
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Handle a key press. Auto-repeat events are ignored.
    ///
    /// A jump request is raised only on the edge from released to pressed,
    /// so one physical press can never queue two jumps.
    pub fn key_down(&mut self, key: Key, repeat: bool) {
        if repeat {
            return;
        }
        match key {
            Key::Forward => self.movement.forward = true,
            Key::Backward => self.movement.backward = true,
            Key::Left => self.movement.left = true,
            Key::Right => self.movement.right = true,
            Key::Jump => {
                if !self.jump_held {
                    self.jump_requested = true;
                }
                self.jump_held = true;
            }
        }
    }

    pub fn key_up(&mut self, key: Key) {
        match key {
            Key::Forward => self.movement.forward = false,
            Key::Backward => self.movement.backward = false,
            Key::Left => self.movement.left = false,
            Key::Right => self.movement.right = false,
            Key::Jump => self.jump_held = false,
        }
    }

    /// [`key_down`](Self::key_down) by key code. Returns `false` for unmapped codes.
    pub fn key_down_code(&mut self, code: &str, repeat: bool) -> bool {
        Key::from_code(code)
            .map(|key| self.key_down(key, repeat))
            .is_some()
    }

    pub fn key_up_code(&mut self, code: &str) -> bool {
        Key::from_code(code).map(|key| self.key_up(key)).is_some()
    }

    pub fn movement(&self) -> MovementKeys {
        self.movement
    }

    pub fn has_movement(&self) -> bool {
        self.movement.any()
    }

    pub fn jump_requested(&self) -> bool {
        self.jump_requested
    }

    /// Consume the pending jump request.
    pub fn take_jump_request(&mut self) -> bool {
        std::mem::take(&mut self.jump_requested)
    }

    /// Release every key, e.g. when the view loses focus.
    pub fn release_all(&mut self) {
        self.movement = MovementKeys::default();
        self.jump_held = false;
        self.jump_requested = false;
    }

    // ========================================================================
    // Pointer
    // ========================================================================

    /// Handle one raw pointer-movement event and return the accepted delta.
    ///
    /// An event moving more than a third of the viewport on either axis is a
    /// platform glitch; it is replaced with the previous accepted delta.
    pub fn pointer_moved(&mut self, dx: f32, dy: f32) -> Vec2 {
        let delta = Vec2::new(dx, dy);
        let glitch = !delta.is_finite()
            || dx.abs() > self.viewport.width / 3.0
            || dy.abs() > self.viewport.height / 3.0;

        let accepted = if glitch {
            log::warn!(
                "Rejected pointer delta ({}, {}), reusing {:?}",
                dx,
                dy,
                self.last_accepted
            );
            self.last_accepted
        } else {
            delta
        };

        self.last_accepted = accepted;
        self.look_delta += accepted;
        accepted
    }

    /// Pointer movement accumulated since the last take.
    pub fn look_delta(&self) -> Vec2 {
        self.look_delta
    }

    /// Consume the accumulated pointer movement.
    pub fn take_look_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.look_delta)
    }
}
