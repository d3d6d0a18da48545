//! Environment-driven configuration for the bundled binary.
//!
//! Library users configure [`ServerConfig`] and [`DispatchConfig`] directly;
//! this only maps `BCI_*` variables onto them.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::core::{BridgeError, Result};
use crate::dispatch::DispatchConfig;
use crate::server::ServerConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub dispatch: DispatchConfig,
    /// Main-loop ticks per second
    pub tick_hz: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            dispatch: DispatchConfig::default(),
            tick_hz: 60,
        }
    }
}

impl BridgeConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup; unset keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("BCI_HOST") {
            config.server.host = host;
        }
        if let Some(port) = parse_var::<u16>(&lookup, "BCI_PORT")? {
            config.server.port = port;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "BCI_REQUEST_TIMEOUT_SECS")? {
            config.server.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "BCI_SHUTDOWN_GRACE_MS")? {
            config.server.shutdown_grace = Duration::from_millis(ms);
        }
        if let Some(start) = parse_var::<bool>(&lookup, "BCI_START_ON_PLAY")? {
            config.server.start_on_play = start;
        }
        if let Some(hz) = parse_var::<u32>(&lookup, "BCI_TICK_HZ")? {
            config.tick_hz = hz;
        }
        if let Some(threshold) = parse_var::<f32>(&lookup, "BCI_STRENGTH_THRESHOLD")? {
            config.dispatch.strength_threshold = threshold;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "BCI_COMMAND_COOLDOWN_MS")? {
            config.dispatch.command_cooldown = Duration::from_millis(ms);
        }
        if let Some(max) = parse_var::<usize>(&lookup, "BCI_MAX_COMMANDS_PER_SECOND")? {
            config.dispatch.max_commands_per_second = max;
        }

        config.validate()?;
        Ok(config)
    }

    /// Interval between main-loop ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_hz == 0 {
            return Err(BridgeError::Config("tick_hz must be > 0".to_string()));
        }
        self.server.validate()?;
        self.dispatch.validate()
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| BridgeError::Config(format!("{} has an invalid value: '{}'", key, raw))),
    }
}
