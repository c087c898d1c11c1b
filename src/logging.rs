//! Tracing setup
//!
//! Always logs to stderr. With a log directory configured, two daily rolling
//! files are added: `agent_dashboard.log` with everything and
//! `agent_activities.log` with only the per-agent activity entries.

use crate::config::LoggingConfig;
use crate::error::{DashError, Result};
use crate::sink::ACTIVITY_TARGET;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

const GENERAL_LOG_PREFIX: &str = "agent_dashboard";
const ACTIVITY_LOG_PREFIX: &str = "agent_activities";

/// Keeps the non-blocking file writers flushing; hold for the life of the process
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Default filter when `RUST_LOG` is not set
pub fn default_directives(level: &str) -> String {
    format!(
        "warn,solar_dash_core={lvl},solar_dash={lvl},{activity}=info,tower_http=warn",
        lvl = level,
        activity = ACTIVITY_TARGET
    )
}

/// Install the global subscriber
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuards> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(&config.level)))
        .map_err(|e| DashError::Logging(format!("invalid log filter: {}", e)))?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let mut guards = Vec::new();
    let (general_layer, activity_layer) = match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;

            let general = daily_appender(dir, GENERAL_LOG_PREFIX, config.general_retention_days)?;
            let (general_writer, guard) = tracing_appender::non_blocking(general);
            guards.push(guard);

            let activity =
                daily_appender(dir, ACTIVITY_LOG_PREFIX, config.activity_retention_days)?;
            let (activity_writer, guard) = tracing_appender::non_blocking(activity);
            guards.push(guard);

            (
                Some(
                    fmt::layer()
                        .with_writer(general_writer)
                        .with_ansi(false)
                        .with_target(true),
                ),
                Some(
                    fmt::layer()
                        .with_writer(activity_writer)
                        .with_ansi(false)
                        .with_target(false)
                        .with_filter(Targets::new().with_target(ACTIVITY_TARGET, Level::INFO)),
                ),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(general_layer)
        .with(activity_layer)
        .try_init()
        .map_err(|e| DashError::Logging(e.to_string()))?;

    if let Some(dir) = &config.dir {
        tracing::debug!("Writing log files to {}", dir.display());
    }

    Ok(LogGuards { _guards: guards })
}

fn daily_appender(dir: &Path, prefix: &str, keep: usize) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(keep)
        .build(dir)
        .map_err(|e| DashError::Logging(format!("cannot open {} log: {}", prefix, e)))
}
