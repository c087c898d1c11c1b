//! Dashboard configuration
//!
//! Scheduling intervals for the periodic tasks, front-end address and
//! logging setup. Loaded from TOML; every section has a default so a partial
//! file (or no file at all) is valid.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// HTTP/WebSocket front-end
    pub server: ServerConfig,

    /// Health monitor schedule
    pub health: TaskSchedule,

    /// Metrics collector schedule
    pub metrics: TaskSchedule,

    /// Broadcast schedule and delivery limits
    pub broadcast: BroadcastConfig,

    /// Health probe limits
    pub probe: ProbeConfig,

    /// Log output
    pub logging: LoggingConfig,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            health: TaskSchedule::health_default(),
            metrics: TaskSchedule::metrics_default(),
            broadcast: BroadcastConfig::default(),
            probe: ProbeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub addr: SocketAddr,

    /// Outbound buffer per WebSocket client (messages)
    pub client_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: ([0, 0, 0, 0], 8000).into(),
            client_buffer: 64,
        }
    }
}

/// Interval between successful cycles and backoff after a failed one
///
/// Both keys are required when the table is present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSchedule {
    #[serde(with = "serde_duration")]
    pub interval: Duration,

    #[serde(with = "serde_duration")]
    pub backoff: Duration,
}

impl TaskSchedule {
    pub const fn new(interval: Duration, backoff: Duration) -> Self {
        Self { interval, backoff }
    }

    pub const fn health_default() -> Self {
        Self::new(Duration::from_secs(30), Duration::from_secs(5))
    }

    pub const fn metrics_default() -> Self {
        Self::new(Duration::from_secs(60), Duration::from_secs(10))
    }

    pub const fn broadcast_default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(5))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    #[serde(with = "serde_duration")]
    pub interval: Duration,

    #[serde(with = "serde_duration")]
    pub backoff: Duration,

    /// A subscriber that does not accept a message within this window is pruned
    #[serde(with = "serde_duration")]
    pub send_timeout: Duration,
}

impl BroadcastConfig {
    pub fn schedule(&self) -> TaskSchedule {
        TaskSchedule::new(self.interval, self.backoff)
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        let schedule = TaskSchedule::broadcast_default();
        Self {
            interval: schedule.interval,
            backoff: schedule.backoff,
            send_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// A probe that has not answered within this window counts as failed
    #[serde(with = "serde_duration")]
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for this crate's own targets
    pub level: String,

    /// Directory for rotating log files; stderr only when unset
    pub dir: Option<PathBuf>,

    /// Daily files kept for the general log
    pub general_retention_days: usize,

    /// Daily files kept for the agent activity log
    pub activity_retention_days: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            general_retention_days: 30,
            activity_retention_days: 90,
        }
    }
}

// Custom serde module for Duration (serialize/deserialize as seconds)
mod serde_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl DashConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: DashConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_schedule("health", &self.health)?;
        self.validate_schedule("metrics", &self.metrics)?;
        self.validate_schedule("broadcast", &self.broadcast.schedule())?;

        if self.broadcast.send_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "broadcast: send_timeout must be at least 1 second".to_string(),
            ));
        }

        if self.probe.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "probe: timeout must be at least 1 second".to_string(),
            ));
        }

        if self.server.client_buffer == 0 {
            return Err(ConfigError::ValidationError(
                "server: client_buffer must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_schedule(&self, name: &str, schedule: &TaskSchedule) -> Result<(), ConfigError> {
        if schedule.interval.is_zero() {
            return Err(ConfigError::ValidationError(format!(
                "{}: interval must be at least 1 second",
                name
            )));
        }

        if schedule.backoff.is_zero() {
            return Err(ConfigError::ValidationError(format!(
                "{}: backoff must be at least 1 second",
                name
            )));
        }

        Ok(())
    }
}
