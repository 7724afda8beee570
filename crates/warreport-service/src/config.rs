//! Service configuration.
//!
//! Configuration is layered: built-in defaults, then optional YAML files,
//! then environment variables prefixed `WARREPORT__`. Every field carries
//! a serde default so an entirely unconfigured environment yields a valid
//! config; a malformed file or an uncoercible environment variable is a
//! hard error because it indicates deliberate-but-broken operator input.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Errors produced by configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub worker: WorkerConfig,

    #[serde(default)]
    pub reporter: ReporterConfig,

    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.poll_interval_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.discovery.lookback_ticks == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.lookback_ticks".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.discovery.continuation_budget_ticks == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.continuation_budget_ticks".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "api.timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Upstream API endpoints and client behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_history_url")]
    pub history_url: String,

    #[serde(default = "default_alliances_url")]
    pub alliances_url: String,

    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            history_url: default_history_url(),
            alliances_url: default_alliances_url(),
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Discovery stage tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Seconds between battle-list polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Lookback interval, in ticks, used when the cursor has expired.
    #[serde(default = "default_lookback_ticks")]
    pub lookback_ticks: u64,

    /// How far past discovery a single battle may grow before being
    /// force-finalized as still ongoing.
    #[serde(default = "default_continuation_budget_ticks")]
    pub continuation_budget_ticks: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            lookback_ticks: default_lookback_ticks(),
            continuation_budget_ticks: default_continuation_budget_ticks(),
        }
    }
}

impl DiscoveryConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Reconstruction worker tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkerConfig {
    /// Seconds to wait when the queue is idle or a room is not ready.
    #[serde(default = "default_worker_retry_secs")]
    pub retry_delay_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            retry_delay_secs: default_worker_retry_secs(),
        }
    }
}

impl WorkerConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Reporter stage tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReporterConfig {
    /// Notification webhook endpoint. Absent means dry-run: reports are
    /// written to the operational log instead.
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Seconds to wait after a failed publish or an empty queue.
    #[serde(default = "default_reporter_retry_secs")]
    pub retry_delay_secs: u64,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            retry_delay_secs: default_reporter_retry_secs(),
        }
    }
}

impl ReporterConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Shutdown drain behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShutdownConfig {
    /// Seconds to wait for in-flight work before force-terminating.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_secs: default_grace_secs(),
        }
    }
}

impl ShutdownConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

fn default_api_url() -> String {
    "https://screeps.com/api".to_string()
}

fn default_history_url() -> String {
    "https://screeps.com/room-history".to_string()
}

fn default_alliances_url() -> String {
    "https://www.leagueofautomatednations.com/alliances.js".to_string()
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_lookback_ticks() -> u64 {
    2000
}

fn default_continuation_budget_ticks() -> u64 {
    2000
}

fn default_worker_retry_secs() -> u64 {
    5
}

fn default_reporter_retry_secs() -> u64 {
    60
}

fn default_grace_secs() -> u64 {
    30
}
