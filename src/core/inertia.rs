//! Inertial scroll with exponential ease-out.
//!
//! Raw input only moves the *target*.  Each frame the position closes a
//! fixed fraction of the remaining distance, so a burst of wheel notches
//! turns into one smooth glide that decelerates into place.

use std::time::Duration;

/// Where a scroll delta came from.  Each source has its own multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Wheel,
    Touch,
    Keyboard,
}

/// Tuning for [`Inertia`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaConfig {
    /// Fraction of the remaining distance covered per 60 Hz frame.
    /// Good range: 0.05–0.3.
    pub lerp: f64,
    pub wheel_multiplier: f64,
    pub touch_multiplier: f64,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            lerp: 0.1,
            wheel_multiplier: 1.0,
            touch_multiplier: 2.0,
        }
    }
}

/// Distance below which the position snaps onto the target.
const SETTLE_EPSILON: f64 = 0.01;

/// Smoothed scroll position driver.
#[derive(Debug, Clone)]
pub struct Inertia {
    current: f64,
    target: f64,
    /// Upper scroll bound; input past either end is resisted by clamping.
    limit: f64,
    config: InertiaConfig,
    stopped: bool,
}

impl Inertia {
    pub fn new(config: InertiaConfig) -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            limit: 0.0,
            config: InertiaConfig {
                lerp: config.lerp.clamp(0.01, 1.0),
                ..config
            },
            stopped: false,
        }
    }

    /// Start from an existing position (e.g. when switching modes).
    pub fn jump_to(&mut self, position: f64) {
        self.current = position.clamp(0.0, self.limit);
        self.target = self.current;
    }

    pub fn set_limit(&mut self, limit: f64) {
        self.limit = limit.max(0.0);
        self.target = self.target.clamp(0.0, self.limit);
        self.current = self.current.clamp(0.0, self.limit);
    }

    /// Feed a raw input delta.  Ignored once the driver has been stopped.
    pub fn push(&mut self, delta: f64, kind: InputKind) {
        if self.stopped {
            return;
        }
        let multiplier = match kind {
            InputKind::Wheel => self.config.wheel_multiplier,
            InputKind::Touch => self.config.touch_multiplier,
            InputKind::Keyboard => 1.0,
        };
        self.target = (self.target + delta * multiplier).clamp(0.0, self.limit);
    }

    /// Glide toward an absolute position.
    pub fn set_target(&mut self, target: f64) {
        if !self.stopped {
            self.target = target.clamp(0.0, self.limit);
        }
    }

    /// Advance one frame of `dt`.  Returns the new position when it moved.
    pub fn tick(&mut self, dt: Duration) -> Option<f64> {
        if self.stopped || !self.is_animating() {
            return None;
        }
        let frames = dt.as_secs_f64() * 60.0;
        let factor = 1.0 - (1.0 - self.config.lerp).powf(frames);
        let before = self.current;
        self.current += (self.target - self.current) * factor;
        if (self.target - self.current).abs() < SETTLE_EPSILON {
            self.current = self.target;
        }
        (self.current != before).then_some(self.current)
    }

    /// Freeze the driver where it is; later input is ignored.
    pub fn stop(&mut self) {
        self.stopped = true;
        self.target = self.current;
    }

    pub fn position(&self) -> f64 {
        self.current
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// True while there is still visible motion left.
    pub fn is_animating(&self) -> bool {
        self.current != self.target
    }
}
