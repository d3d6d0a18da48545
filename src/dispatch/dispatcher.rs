use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info};

use super::actuator::{Actuation, Actuator};
use super::config::DispatchConfig;
use super::filter::{Cooldown, CooldownCheck, RateLimiter};
use crate::clock::{Clock, MonotonicClock};
use crate::core::{MentalCommand, Result, Vec3};
use crate::events::CommandListener;

/// What happened to one command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchOutcome {
    Actuated(Actuation),
    BelowThreshold,
    Neutral,
    RateLimited,
    CoolingDown,
    SameCommandCooldown,
    NotGrounded,
    Unrecognized,
    DeadZone,
}

impl DispatchOutcome {
    pub fn is_actuated(&self) -> bool {
        matches!(self, DispatchOutcome::Actuated(_))
    }

    pub fn actuation(&self) -> Option<Actuation> {
        match self {
            DispatchOutcome::Actuated(actuation) => Some(*actuation),
            _ => None,
        }
    }
}

/// Per-entity filter pipeline and actuation mapping.
///
/// All state is owned by the main loop; nothing here is shared with the
/// network thread.
pub struct CommandDispatcher<A: Actuator> {
    config: DispatchConfig,
    actuator: A,
    clock: Box<dyn Clock>,
    rate_limiter: RateLimiter,
    cooldown: Cooldown,
}

impl<A: Actuator> CommandDispatcher<A> {
    pub fn new(config: DispatchConfig, actuator: A) -> Result<Self> {
        Self::with_clock(config, actuator, MonotonicClock::new())
    }

    pub fn with_clock<C>(config: DispatchConfig, actuator: A, clock: C) -> Result<Self>
    where
        C: Clock + 'static,
    {
        config.validate()?;
        let rate_limiter = RateLimiter::new(config.max_commands_per_second, config.rate_window);
        let cooldown = Cooldown::new(config.command_cooldown, config.same_command_window());
        Ok(Self {
            config,
            actuator,
            clock: Box::new(clock),
            rate_limiter,
            cooldown,
        })
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    pub fn last_command(&self) -> Option<&str> {
        self.cooldown.last_label()
    }

    pub fn last_command_time(&self) -> Option<Duration> {
        self.cooldown.last_time()
    }

    pub fn is_on_cooldown(&self) -> bool {
        self.cooldown.is_active(self.clock.now())
    }

    /// Per-tick housekeeping: expires the cooldown timer and ages out the
    /// rate window.
    pub fn update(&mut self) {
        let now = self.clock.now();
        self.cooldown.tick(now);
        self.rate_limiter.evict(now);
    }

    /// Runs one signal-driven command through the full pipeline.
    pub fn handle(&mut self, label: &str, strength: f32) -> DispatchOutcome {
        let now = self.clock.now();
        self.handle_at(label, strength, now)
    }

    /// Same as [`handle`](Self::handle); kept for manual testing from a host
    /// console without going through the network.
    pub fn test_command(&mut self, label: &str, strength: f32) -> DispatchOutcome {
        debug!(label, strength, "test command");
        self.handle(label, strength)
    }

    fn handle_at(&mut self, label: &str, strength: f32, now: Duration) -> DispatchOutcome {
        // NaN strengths fail this comparison and are dropped with the weak ones.
        if !(strength >= self.config.strength_threshold) {
            debug!(
                label,
                strength,
                threshold = self.config.strength_threshold,
                "command too weak"
            );
            return DispatchOutcome::BelowThreshold;
        }

        let normalized = MentalCommand::normalize(label);
        if normalized == MentalCommand::Neutral.as_str() {
            return DispatchOutcome::Neutral;
        }

        if !self.rate_limiter.try_acquire(now) {
            debug!(label, "rate limited");
            return DispatchOutcome::RateLimited;
        }

        match self.cooldown.check(&normalized, now) {
            CooldownCheck::Global => {
                debug!(label, "cooldown active");
                return DispatchOutcome::CoolingDown;
            }
            CooldownCheck::SameCommand => {
                debug!(label, "same command cooldown");
                return DispatchOutcome::SameCommandCooldown;
            }
            CooldownCheck::Ready => {}
        }

        self.cooldown.start(&normalized, now);
        self.execute(&normalized, strength)
    }

    fn execute(&mut self, label: &str, strength: f32) -> DispatchOutcome {
        let Ok(command) = MentalCommand::from_str(label) else {
            debug!(label, "unrecognized command ignored");
            return DispatchOutcome::Unrecognized;
        };

        let scaled = self.config.scale_strength(strength);
        let move_magnitude = self.config.move_speed * scaled * self.config.force_multiplier;

        let actuation = match command {
            MentalCommand::Left => Actuation::Force {
                direction: Vec3::LEFT,
                magnitude: move_magnitude,
            },
            MentalCommand::Right => Actuation::Force {
                direction: Vec3::RIGHT,
                magnitude: move_magnitude,
            },
            MentalCommand::Push => Actuation::Force {
                direction: Vec3::FORWARD,
                magnitude: move_magnitude,
            },
            MentalCommand::Pull => Actuation::Force {
                direction: Vec3::BACK,
                magnitude: move_magnitude,
            },
            MentalCommand::Lift => {
                if !self.actuator.is_grounded() {
                    debug!("lift ignored, not grounded");
                    return DispatchOutcome::NotGrounded;
                }
                Actuation::Impulse {
                    direction: Vec3::UP,
                    magnitude: self.config.jump_force * scaled,
                }
            }
            MentalCommand::Neutral => return DispatchOutcome::Neutral,
        };

        actuation.apply_to(&mut self.actuator);
        info!(
            command = %command,
            strength,
            magnitude = actuation.magnitude(),
            "command actuated"
        );
        DispatchOutcome::Actuated(actuation)
    }

    /// Continuous move driven by per-tick human input.
    ///
    /// Skips every filter; only the dead zone and the strength clamp apply.
    pub fn move_direct(&mut self, direction: Vec3, strength: f32) -> DispatchOutcome {
        if direction.length_squared() < self.config.move_dead_zone {
            return DispatchOutcome::DeadZone;
        }

        let scaled = self.config.scale_strength(strength);
        let actuation = Actuation::Force {
            direction: direction.normalized(),
            magnitude: self.config.move_speed * scaled,
        };
        actuation.apply_to(&mut self.actuator);
        debug!(?direction, strength, "direct move");
        DispatchOutcome::Actuated(actuation)
    }

    /// Grounded-gated jump driven by human input. Skips every filter.
    pub fn jump_direct(&mut self, strength: f32) -> DispatchOutcome {
        if !self.actuator.is_grounded() {
            return DispatchOutcome::NotGrounded;
        }

        let scaled = self.config.scale_strength(strength);
        let actuation = Actuation::Impulse {
            direction: Vec3::UP,
            magnitude: self.config.jump_force * scaled,
        };
        actuation.apply_to(&mut self.actuator);
        debug!(strength, "direct jump");
        DispatchOutcome::Actuated(actuation)
    }
}

impl<A: Actuator> CommandListener for CommandDispatcher<A> {
    fn on_command(&mut self, label: &str, strength: f32) {
        self.handle(label, strength);
    }
}

impl<A: Actuator + std::fmt::Debug> std::fmt::Debug for CommandDispatcher<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("config", &self.config)
            .field("actuator", &self.actuator)
            .field("rate_limiter", &self.rate_limiter)
            .field("cooldown", &self.cooldown)
            .finish()
    }
}
