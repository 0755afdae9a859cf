//! Core error types for kairos-core.
//!
//! Every error in this hierarchy is caller-facing and recoverable; the
//! surrounding chat layer reports them verbatim to the user.

use std::path::PathBuf;
use thiserror::Error;

use crate::ids::TaskId;
use crate::timer::{Phase, SessionCommand};

/// Core error type for kairos-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Text handed to the extractor had nothing left once tags were removed.
    #[error("Task title is empty")]
    EmptyTitle,

    /// The user already owns a running pomodoro session.
    #[error("A pomodoro session is already active")]
    SessionAlreadyActive,

    /// The user has no pomodoro session to operate on.
    #[error("No active pomodoro session")]
    NoActiveSession,

    /// The command is not valid in the session's current phase.
    #[error("Cannot {command} while the session is {phase}")]
    InvalidTransition {
        phase: Phase,
        command: SessionCommand,
    },

    /// No task of the user matches the given id or title.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// The assistant has no session journal to report from.
    #[error("Analytics are not available")]
    AnalyticsUnavailable,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Upstream task store failures
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Task store errors.
///
/// These are opaque upstream failures from the core's point of view.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the request.
    #[error("Task store unavailable: {0}")]
    Unavailable(String),

    /// No task with the given identifier exists.
    #[error("Task not found: {0}")]
    NotFound(TaskId),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Store(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_message_names_phase_and_command() {
        let err = CoreError::InvalidTransition {
            phase: Phase::Paused,
            command: SessionCommand::Pause,
        };
        assert_eq!(err.to_string(), "Cannot pause while the session is paused");
    }

    #[test]
    fn sqlite_errors_become_unavailable() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
