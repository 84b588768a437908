//! Fixed-timestep clock.
//!
//! Real time flows in through [`FrameTimer`], is banked in
//! [`SimulationClock`], and comes out as a whole number of fixed physics ticks
//! plus an interpolation fraction for rendering. [`RenderThrottle`] optionally
//! caps how often render passes run.

use std::time::Instant;

/// Result of one [`SimulationClock::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockAdvance {
    /// Physics ticks due now.
    pub ticks: u32,

    /// Interpolation fraction for this render pass, in `[0, 1]`.
    pub alpha: f32,

    /// Simulated time discarded because the catch-up cap was hit (s).
    pub dropped: f32,
}

/// Fixed-interval accumulator.
///
/// Holds its accumulator in `f64` so long sessions do not drift.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    interval: f64,
    accumulator: f64,
    alpha: f32,
    max_catch_up_ticks: u32,
    paused: bool,
    total_ticks: u64,
}

impl SimulationClock {
    /// Create a clock ticking `tick_rate` times per second.
    ///
    /// # Panics
    ///
    /// Panics if `tick_rate` is not a positive finite number.
    pub fn new(tick_rate: f32, max_catch_up_ticks: u32) -> Self {
        assert!(
            tick_rate.is_finite() && tick_rate > 0.0,
            "tick rate must be positive, got {}",
            tick_rate
        );

        Self {
            interval: 1.0 / tick_rate as f64,
            accumulator: 0.0,
            alpha: 0.0,
            max_catch_up_ticks: max_catch_up_ticks.max(1),
            paused: false,
            total_ticks: 0,
        }
    }

    /// Bank `real_delta` seconds and report the ticks now due.
    ///
    /// Fires at most `max_catch_up_ticks` ticks; if time is still owed after
    /// that, the backlog is dropped instead of carried into later frames.
    /// Negative or non-finite deltas count as zero.
    pub fn advance(&mut self, real_delta: f32) -> ClockAdvance {
        if self.paused {
            return ClockAdvance {
                ticks: 0,
                alpha: self.alpha,
                dropped: 0.0,
            };
        }

        if real_delta.is_finite() && real_delta > 0.0 {
            self.accumulator += real_delta as f64;
        }

        let mut ticks = 0;
        while self.accumulator >= self.interval && ticks < self.max_catch_up_ticks {
            self.accumulator -= self.interval;
            ticks += 1;
        }

        let mut dropped = 0.0;
        if self.accumulator >= self.interval {
            dropped = self.accumulator as f32;
            log::warn!(
                "Simulation fell behind, dropping {:.3}s after {} catch-up ticks",
                dropped,
                ticks
            );
            self.accumulator = 0.0;
        }

        self.total_ticks += ticks as u64;
        self.alpha = if ticks > 0 {
            1.0
        } else {
            self.remainder_fraction().clamp(0.0, 1.0)
        };

        ClockAdvance {
            ticks,
            alpha: self.alpha,
            dropped,
        }
    }

    /// Freeze the accumulator.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Continue from the frozen accumulator.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Fixed tick length in seconds.
    pub fn interval(&self) -> f32 {
        self.interval as f32
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Fraction from the last advance.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// `accumulator / interval`, regardless of whether a tick just fired.
    pub fn remainder_fraction(&self) -> f32 {
        (self.accumulator / self.interval) as f32
    }

    pub fn max_catch_up_ticks(&self) -> u32 {
        self.max_catch_up_ticks
    }

    /// Ticks fired since creation.
    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }
}

/// Caps render passes to a fixed rate.
#[derive(Debug, Clone)]
pub struct RenderThrottle {
    interval: Option<f32>,
    accumulator: f32,
}

impl RenderThrottle {
    /// `rate <= 0` disables throttling.
    pub fn new(rate: f32) -> Self {
        let interval = (rate.is_finite() && rate > 0.0).then(|| 1.0 / rate);
        Self {
            interval,
            accumulator: 0.0,
        }
    }

    pub fn is_uncapped(&self) -> bool {
        self.interval.is_none()
    }

    /// Returns the render delta if a render pass should run this display tick.
    ///
    /// Uncapped throttles pass every tick through with the real delta. Capped
    /// ones run once their accumulator exceeds the interval and report the
    /// fixed interval.
    pub fn admit(&mut self, real_delta: f32) -> Option<f32> {
        let Some(interval) = self.interval else {
            return Some(real_delta);
        };

        self.accumulator += real_delta.max(0.0);
        if self.accumulator > interval {
            self.accumulator %= interval;
            Some(interval)
        } else {
            None
        }
    }
}

/// Measures real time between display ticks.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Option<Instant>,
    running: bool,
    time_scale: f32,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: None,
            running: true,
            time_scale: 1.0,
        }
    }

    /// Seconds since the previous poll, scaled. The first poll returns zero.
    pub fn poll(&mut self) -> f32 {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> f32 {
        if !self.running {
            return 0.0;
        }
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        delta * self.time_scale
    }

    /// Stop measuring; polls return zero until [`start`](Self::start).
    pub fn stop(&mut self) {
        self.running = false;
        self.last = None;
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Resume measuring from `now`, so the stopped span is never reported.
    pub fn start_at(&mut self, now: Instant) {
        self.running = true;
        self.last = Some(now);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Multiplier on reported time (slow motion, fast forward).
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

// ============================================================================
// Tests
// ============================================================================
