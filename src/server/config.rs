use std::time::Duration;

use crate::core::{BridgeError, Result};

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind; loopback by default
    pub host: String,

    /// TCP port, `0` picks an ephemeral one
    pub port: u16,

    /// Upper bound for a routed request, including reading its body. The
    /// clock starts once the request line and headers have been parsed.
    pub request_timeout: Option<Duration>,

    /// How long `stop()` lets open connections finish before closing them
    pub shutdown_grace: Duration,

    /// Whether the host should start the listener as soon as it boots
    pub start_on_play: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout: Some(Duration::from_secs(30)),
            shutdown_grace: Duration::from_secs(1),
            start_on_play: true,
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn without_request_timeout(mut self) -> Self {
        self.request_timeout = None;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn start_on_play(mut self, start: bool) -> Self {
        self.start_on_play = start;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(BridgeError::Config("host cannot be empty".to_string()));
        }

        if self.request_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(BridgeError::Config(
                "request_timeout must be > 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}
