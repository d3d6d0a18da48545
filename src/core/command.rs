use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{BridgeError, Result};

/// A single instruction submitted by the external signal source.
///
/// Records are created by the ingress parser, owned by the queue until
/// drained, and dropped after dispatch. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    command: String,
    /// Producer-supplied, not clamped on ingress.
    #[serde(default)]
    strength: f32,
    /// Producer-supplied and advisory only.
    #[serde(default)]
    timestamp: i64,
}

impl CommandRecord {
    pub fn new(command: impl Into<String>, strength: f32, timestamp: i64) -> Self {
        Self {
            command: command.into(),
            strength,
            timestamp,
        }
    }

    /// Parses a `POST /command` body.
    ///
    /// Fails on malformed JSON, a missing `command` field or a blank label.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let record: CommandRecord = serde_json::from_slice(body)?;
        if record.command.trim().is_empty() {
            return Err(BridgeError::InvalidCommand(
                "command must not be empty".to_string(),
            ));
        }
        Ok(record)
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }
}

/// Labels the dispatcher knows how to actuate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MentalCommand {
    Left,
    Right,
    Push,
    Pull,
    Lift,
    Neutral,
}

impl MentalCommand {
    /// Case-insensitive, whitespace-trimmed form used for every comparison.
    pub fn normalize(label: &str) -> String {
        label.trim().to_lowercase()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MentalCommand::Left => "left",
            MentalCommand::Right => "right",
            MentalCommand::Push => "push",
            MentalCommand::Pull => "pull",
            MentalCommand::Lift => "lift",
            MentalCommand::Neutral => "neutral",
        }
    }
}

impl FromStr for MentalCommand {
    type Err = BridgeError;

    fn from_str(label: &str) -> Result<Self> {
        match Self::normalize(label).as_str() {
            "left" => Ok(MentalCommand::Left),
            "right" => Ok(MentalCommand::Right),
            "push" => Ok(MentalCommand::Push),
            "pull" => Ok(MentalCommand::Pull),
            "lift" => Ok(MentalCommand::Lift),
            "neutral" => Ok(MentalCommand::Neutral),
            other => Err(BridgeError::InvalidCommand(format!(
                "unrecognized command '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for MentalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
