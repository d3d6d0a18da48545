use std::time::Duration;

use crate::core::{BridgeError, Result};

/// Tuning for one actuatable entity.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    /// Base lateral/forward speed
    pub move_speed: f32,

    /// Upward impulse for `lift` at full strength
    pub jump_force: f32,

    /// Extra factor applied to signal-driven movement forces
    pub force_multiplier: f32,

    /// Minimum separation between two accepted commands
    pub command_cooldown: Duration,

    /// The same label must wait `command_cooldown * same_command_factor`
    pub same_command_factor: f32,

    /// Commands weaker than this are dropped (boundary inclusive)
    pub strength_threshold: f32,

    /// Rate limiter cap inside `rate_window`
    pub max_commands_per_second: usize,

    /// Sliding window the rate limiter counts over
    pub rate_window: Duration,

    /// Strength is clamped into `[min_scaled_strength, 1.0]` before scaling forces
    pub min_scaled_strength: f32,

    /// Direct moves with a squared length below this are ignored
    pub move_dead_zone: f32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            move_speed: 8.0,
            jump_force: 12.0,
            force_multiplier: 100.0,
            command_cooldown: Duration::from_millis(150),
            same_command_factor: 1.5,
            strength_threshold: 0.3,
            max_commands_per_second: 8,
            rate_window: Duration::from_secs(1),
            min_scaled_strength: 0.3,
            move_dead_zone: 0.01,
        }
    }
}

impl DispatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    pub fn jump_force(mut self, force: f32) -> Self {
        self.jump_force = force;
        self
    }

    pub fn force_multiplier(mut self, multiplier: f32) -> Self {
        self.force_multiplier = multiplier;
        self
    }

    pub fn command_cooldown(mut self, cooldown: Duration) -> Self {
        self.command_cooldown = cooldown;
        self
    }

    pub fn same_command_factor(mut self, factor: f32) -> Self {
        self.same_command_factor = factor;
        self
    }

    pub fn strength_threshold(mut self, threshold: f32) -> Self {
        self.strength_threshold = threshold;
        self
    }

    pub fn max_commands_per_second(mut self, max: usize) -> Self {
        self.max_commands_per_second = max;
        self
    }

    pub fn rate_window(mut self, window: Duration) -> Self {
        self.rate_window = window;
        self
    }

    /// Window inside which a repeat of the last accepted label is dropped.
    pub fn same_command_window(&self) -> Duration {
        let nanos = self.command_cooldown.as_nanos() as f64 * f64::from(self.same_command_factor);
        Duration::from_nanos(nanos.round() as u64)
    }

    /// Clamps a producer strength into the range used for force scaling.
    pub fn scale_strength(&self, strength: f32) -> f32 {
        if strength.is_nan() {
            return self.min_scaled_strength;
        }
        strength.clamp(self.min_scaled_strength, 1.0)
    }

    pub fn validate(&self) -> Result<()> {
        let finite_non_negative = [
            ("move_speed", self.move_speed),
            ("jump_force", self.jump_force),
            ("force_multiplier", self.force_multiplier),
            ("same_command_factor", self.same_command_factor),
            ("strength_threshold", self.strength_threshold),
            ("move_dead_zone", self.move_dead_zone),
        ];
        for (name, value) in finite_non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(BridgeError::Config(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.min_scaled_strength) {
            return Err(BridgeError::Config(
                "min_scaled_strength must be within [0, 1]".to_string(),
            ));
        }

        if self.max_commands_per_second == 0 {
            return Err(BridgeError::Config(
                "max_commands_per_second must be > 0".to_string(),
            ));
        }

        if self.rate_window.is_zero() {
            return Err(BridgeError::Config("rate_window must be > 0".to_string()));
        }

        Ok(())
    }
}
