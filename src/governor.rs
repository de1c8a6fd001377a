// Power ceiling held between loop iterations, stepped by the shoulder buttons

use tracing::debug;

use crate::messages::PowerLevel;

#[derive(Debug, Clone)]
pub struct PowerGovernor {
    level: PowerLevel,
    min: PowerLevel,
    max: PowerLevel,
}

impl PowerGovernor {
    /// Create a governor; `initial` is clamped into range.
    /// `min` must not exceed `max` (checked when the config is built).
    pub fn new(initial: PowerLevel, min: PowerLevel, max: PowerLevel) -> Self {
        Self {
            level: initial.clamp(min, max),
            min,
            max,
        }
    }

    /// Move the level by `delta`, then clamp into [min, max]
    pub fn adjust(&mut self, delta: PowerLevel) -> PowerLevel {
        let requested = self.level.saturating_add(delta);
        self.level = requested.clamp(self.min, self.max);

        if requested > self.max {
            debug!("Power ceilinged at {}", self.level);
        } else if requested < self.min {
            debug!("Power floored at {}", self.level);
        }
        self.level
    }

    pub fn current(&self) -> PowerLevel {
        self.level
    }
}
