//! Frame-time accumulators that turn variable frame deltas into simulation steps.

use crate::grid::Direction;

/// Seconds between gravity steps at normal speed.
pub const GRAVITY_INTERVAL: f64 = 1.0;
/// Seconds between repeated lateral moves while a direction is held.
pub const MOVE_INTERVAL: f64 = 0.15;
/// Gravity speed-up while soft drop is held.
pub const SOFT_DROP_MULTIPLIER: f64 = 10.0;

/// Accumulates elapsed time and fires once per gravity interval.
#[derive(Debug, Clone, Default)]
pub struct GravityClock {
    elapsed: f64,
}

impl GravityClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval(soft_drop: bool) -> f64 {
        let multiplier = if soft_drop { SOFT_DROP_MULTIPLIER } else { 1.0 };
        GRAVITY_INTERVAL / multiplier
    }

    /// Adds `dt` seconds; returns true (and restarts from zero) when the interval is reached.
    pub fn advance(&mut self, dt: f64, soft_drop: bool) -> bool {
        self.elapsed += dt.max(0.0);
        if self.elapsed >= Self::interval(soft_drop) {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }
}

/// Held-direction auto-repeat: one move on press, then one per `MOVE_INTERVAL` while held.
/// Any change of held direction, including release, re-arms the immediate move.
#[derive(Debug, Clone)]
pub struct MoveRepeat {
    held: Option<Direction>,
    elapsed: f64,
    ready: bool,
}

impl Default for MoveRepeat {
    fn default() -> Self {
        Self {
            held: None,
            elapsed: 0.0,
            ready: true,
        }
    }
}

impl MoveRepeat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds this frame's held direction; returns the move to apply, if any.
    pub fn advance(&mut self, held: Option<Direction>, dt: f64) -> Option<Direction> {
        if held != self.held {
            self.held = held;
            self.elapsed = 0.0;
            self.ready = true;
        }
        let direction = held?;
        if !self.ready {
            self.elapsed += dt.max(0.0);
            if self.elapsed >= MOVE_INTERVAL {
                self.elapsed = 0.0;
                self.ready = true;
            }
        }
        if self.ready {
            self.ready = false;
            Some(direction)
        } else {
            None
        }
    }
}
