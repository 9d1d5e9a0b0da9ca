use core::result::Result as CoreResult;
use std::io::Error as IoError;

use thiserror::Error as ThisError;
use toml::de::Error as TomlError;

use crate::task::TaskId;

/// Result type for orchestration operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur in the orchestration core.
#[derive(Debug, ThisError)]
pub enum Error {
    /// The referenced task id is not registered.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The task is already being executed.
    #[error("task already running: {0}")]
    AlreadyRunning(TaskId),

    /// The task already reached a terminal state.
    #[error("task already terminal: {0}")]
    AlreadyTerminal(TaskId),

    /// The plan builder could not produce a usable plan.
    #[error("planning failed: {0}")]
    Planning(String),

    /// A single worker invocation failed.
    #[error("step execution failed: {0}")]
    StepExecution(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Determines whether this error may succeed if retried.
    ///
    /// Only individual worker invocation failures are retryable; every
    /// other variant is either a caller mistake or fatal for the task.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StepExecution(_))
    }

    /// Determines whether this error is a caller-side rejection that
    /// leaves task state untouched.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::AlreadyRunning(_) | Self::AlreadyTerminal(_)
        )
    }
}
