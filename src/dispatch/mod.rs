//! Command shaping: thresholding, rate limiting, cooldown debouncing and the
//! label-to-force mapping applied to every drained command.

pub mod actuator;
pub mod config;
pub mod dispatcher;
pub mod filter;

pub use actuator::{Actuation, Actuator, GroundSensor, RecordingActuator};
pub use config::DispatchConfig;
pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use filter::{Cooldown, CooldownCheck, RateLimiter};
