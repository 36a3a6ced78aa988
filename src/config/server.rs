//! Server configuration.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Listening address and worker pool size for one scheduler process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host or IP the listener binds to.
    pub host: String,
    /// TCP port; `0` binds an ephemeral port (used by tests).
    pub port: u16,
    /// Number of worker threads in the pool.
    pub worker_count: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerConfig {
    /// Create a configuration with the default address `127.0.0.1:8080` and
    /// one worker per available CPU.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            worker_count: num_cpus::get(),
        }
    }

    /// Set the bind host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the bind port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the worker pool size.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty".into());
        }
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        Ok(())
    }

    /// Build a configuration from the environment, after loading `.env` if
    /// present. Recognized variables: `TASKYARD_HOST`, `TASKYARD_PORT`,
    /// `TASKYARD_WORKERS`. Unset or unparseable values fall back to the
    /// defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::new();

        if let Ok(host) = std::env::var("TASKYARD_HOST") {
            config.host = host;
        }
        if let Ok(raw) = std::env::var("TASKYARD_PORT") {
            match raw.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(value = %raw, "ignoring unparseable TASKYARD_PORT"),
            }
        }
        if let Ok(raw) = std::env::var("TASKYARD_WORKERS") {
            match raw.parse() {
                Ok(count) if count > 0 => config.worker_count = count,
                _ => warn!(value = %raw, "ignoring unparseable TASKYARD_WORKERS"),
            }
        }
        config
    }

    /// The `host:port` string the listener binds to.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::new();
        assert!(config.validate().is_ok());
        assert!(config.worker_count >= 1);
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn zero_workers_is_rejected() {
        let config = ServerConfig::new().with_worker_count(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_host_is_rejected() {
        let config = ServerConfig::new().with_host("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ServerConfig::new()
            .with_host("0.0.0.0")
            .with_port(0)
            .with_worker_count(3);
        assert_eq!(config.addr(), "0.0.0.0:0");
        assert_eq!(config.worker_count, 3);
    }
}
