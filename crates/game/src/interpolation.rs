//! Render-side transform interpolation.
//!
//! Physics runs at a fixed rate, rendering at whatever rate the display
//! allows. Each dynamic entity keeps the transform from before and after the
//! most recent physics tick and blends between them by the clock's fraction.

use strider_physics::Transform;

/// Previous/current transform pair of one dynamic entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolated {
    previous: Transform,
    current: Transform,
    rendered: Transform,
    enabled: bool,
}

impl Interpolated {
    pub fn new(transform: Transform) -> Self {
        Self {
            previous: transform,
            current: transform,
            rendered: transform,
            enabled: true,
        }
    }

    /// Record the transform a tick starts from. Call before input forces.
    pub fn capture_previous(&mut self, transform: Transform) {
        self.previous = transform;
    }

    /// Record the transform a tick ends at. Call right after the step.
    pub fn capture_current(&mut self, transform: Transform) {
        self.current = transform;
    }

    /// Jump straight to `transform` with nothing to blend from.
    pub fn teleport(&mut self, transform: Transform) {
        self.previous = transform;
        self.current = transform;
        self.rendered = transform;
    }

    /// Compute the transform to draw for this render pass.
    ///
    /// `alpha >= 1` (a tick just completed) returns the current snapshot
    /// exactly; `alpha == 0` returns the previous one exactly.
    pub fn update(&mut self, alpha: f32) -> Transform {
        self.rendered = if self.enabled {
            self.previous.blend(&self.current, alpha)
        } else {
            self.current
        };
        self.rendered
    }

    pub fn previous(&self) -> Transform {
        self.previous
    }

    pub fn current(&self) -> Transform {
        self.current
    }

    /// Result of the last [`update`](Self::update).
    pub fn rendered(&self) -> Transform {
        self.rendered
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled entities always draw the current snapshot.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
