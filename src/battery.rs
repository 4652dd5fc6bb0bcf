//! Simulated battery that drains at a fixed rate while the robot moves.
//!
//! The drain is not tied to distance travelled and there is no charging.

pub const MAX_LEVEL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Battery {
    level: f64,
    /// Percent per second while moving.
    drain_rate: f64,
}

impl Battery {
    pub fn new(initial: f64, drain_rate: f64) -> Self {
        Self {
            level: initial.clamp(0.0, MAX_LEVEL),
            drain_rate,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Drain `drain_rate × elapsed_ms / 1000` if moving; no-op otherwise.
    pub fn update(&mut self, is_moving: bool, elapsed_ms: u64) {
        if !is_moving {
            return;
        }
        let drain = self.drain_rate * (elapsed_ms as f64 / 1000.0);
        self.level = (self.level - drain).clamp(0.0, MAX_LEVEL);
    }

    pub fn is_low(&self, threshold: f64) -> bool {
        self.level < threshold
    }
}

impl Default for Battery {
    fn default() -> Self {
        Self::new(MAX_LEVEL, 0.008)
    }
}
