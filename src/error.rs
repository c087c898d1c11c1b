//! Error types for the Solar dashboard backend
//!
//! Structured error definitions use thiserror; anyhow is only used at the
//! binary boundary.

use thiserror::Error;

/// Main error type for dashboard operations
#[derive(Error, Debug)]
pub enum DashError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Front-end listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Periodic tasks were started twice
    #[error("Engine is already running")]
    AlreadyRunning,

    /// A periodic task could not be joined on shutdown
    #[error("Failed to stop task {task}: {message}")]
    TaskJoin { task: String, message: String },

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashError>;

/// Failure of a single periodic cycle
///
/// None of these end the task: the periodic driver logs them and backs off.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The cycle body reported a failure, e.g. a broadcast that reached no subscriber
    #[error("{task} cycle failed: {message}")]
    Cycle { task: &'static str, message: String },

    /// The cycle panicked
    #[error("{task} cycle panicked: {message}")]
    Panicked { task: &'static str, message: String },
}

impl TaskError {
    /// Short label for the failure kind, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::Cycle { .. } => "cycle",
            TaskError::Panicked { .. } => "panic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DashError::AlreadyRunning;
        assert_eq!(err.to_string(), "Engine is already running");
    }

    #[test]
    fn test_task_error_kind() {
        let err = TaskError::Panicked {
            task: "broadcast",
            message: "boom".to_string(),
        };
        assert_eq!(err.kind(), "panic");
        assert_eq!(err.to_string(), "broadcast cycle panicked: boom");
    }
}
