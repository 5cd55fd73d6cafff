//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `glowhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use glowhub_adapter_simulated::SimulatedConfig;
use glowhub_app::hub::HubOptions;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reconciliation settings.
    pub poll: PollConfig,
    /// Shared-medium settings.
    pub transport: TransportConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated light network.
    pub simulated: SimulatedConfig,
}

/// Reconciliation timing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Seconds between two sweeps over every light.
    pub interval_secs: u64,
    /// Seconds without a successful read before a light is offline.
    pub offline_threshold_secs: u64,
}

/// Shared-medium configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Upper bound on one transport operation, in milliseconds.
    pub op_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `glowhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// setting fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("glowhub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(secs) = var("GLOWHUB_POLL_INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.poll.interval_secs = secs;
        }
        if let Some(secs) = var("GLOWHUB_OFFLINE_THRESHOLD_SECS").and_then(|v| v.parse().ok()) {
            self.poll.offline_threshold_secs = secs;
        }
        if let Some(ms) = var("GLOWHUB_OP_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.transport.op_timeout_ms = ms;
        }
        if let Some(filter) = var("GLOWHUB_LOG") {
            self.logging.filter = filter;
        }
        if let Some(filter) = var("RUST_LOG") {
            self.logging.filter = filter;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "poll interval must be non-zero".to_string(),
            ));
        }
        if self.poll.offline_threshold_secs == 0 {
            return Err(ConfigError::Validation(
                "offline threshold must be non-zero".to_string(),
            ));
        }
        if self.transport.op_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "operation timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    /// Options for the hub core.
    #[must_use]
    pub fn hub_options(&self) -> HubOptions {
        HubOptions {
            offline_threshold: Duration::from_secs(self.poll.offline_threshold_secs),
            op_timeout: Duration::from_millis(self.transport.op_timeout_ms),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            offline_threshold_secs: 60,
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            op_timeout_ms: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "glowhubd=info,glowhub=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.poll.interval_secs, 30);
        assert_eq!(config.poll.offline_threshold_secs, 60);
        assert_eq!(config.transport.op_timeout_ms, 5000);
        assert_eq!(config.logging.filter, "glowhubd=info,glowhub=info");
        assert!(!config.simulated.lights.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.poll.interval_secs, 30);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [poll]
            interval_secs = 10
            offline_threshold_secs = 90

            [transport]
            op_timeout_ms = 250

            [logging]
            filter = 'debug'

            [simulated]
            latency_ms = 0

            [[simulated.lights]]
            mac = 'd0:73:d5:10:00:01'
            label = 'Garage'
            group = 'Outside'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.poll.interval_secs, 10);
        assert_eq!(config.poll.offline_threshold_secs, 90);
        assert_eq!(config.transport.op_timeout_ms, 250);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.simulated.latency_ms, 0);
        assert_eq!(config.simulated.lights.len(), 1);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [poll]
            interval_secs = 5
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.poll.interval_secs, 5);
        assert_eq!(config.poll.offline_threshold_secs, 60);
        assert_eq!(config.transport.op_timeout_ms, 5000);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.poll.interval_secs, 30);
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }

    #[test]
    fn should_apply_env_overrides() {
        let mut config = Config::default();
        config.apply_overrides(env(&[
            ("GLOWHUB_POLL_INTERVAL_SECS", "15"),
            ("GLOWHUB_OFFLINE_THRESHOLD_SECS", "120"),
            ("GLOWHUB_OP_TIMEOUT_MS", "800"),
            ("GLOWHUB_LOG", "glowhub=debug"),
        ]));
        assert_eq!(config.poll.interval_secs, 15);
        assert_eq!(config.poll.offline_threshold_secs, 120);
        assert_eq!(config.transport.op_timeout_ms, 800);
        assert_eq!(config.logging.filter, "glowhub=debug");
    }

    #[test]
    fn should_prefer_rust_log_over_glowhub_log() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("GLOWHUB_LOG", "warn"), ("RUST_LOG", "trace")]));
        assert_eq!(config.logging.filter, "trace");
    }

    #[test]
    fn should_ignore_unparseable_numeric_override() {
        let mut config = Config::default();
        config.apply_overrides(env(&[("GLOWHUB_POLL_INTERVAL_SECS", "often")]));
        assert_eq!(config.poll.interval_secs, 30);
    }

    #[test]
    fn should_reject_zero_poll_interval() {
        let mut config = Config::default();
        config.poll.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_zero_timeout() {
        let mut config = Config::default();
        config.transport.op_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_build_hub_options() {
        let options = Config::default().hub_options();
        assert_eq!(options.offline_threshold, Duration::from_secs(60));
        assert_eq!(options.op_timeout, Duration::from_millis(5000));
    }
}
