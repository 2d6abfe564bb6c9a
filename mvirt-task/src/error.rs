//! Task error types.

use thiserror::Error;

use crate::status::TaskState;

/// Errors surfaced while tracking a task.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The task reached a terminal failure state.
    ///
    /// Displays as the scheduler-supplied message only; inspect `state` for
    /// finer-grained handling.
    #[error("{message}")]
    Terminated { state: TaskState, message: String },

    /// The other side of the status channel is gone.
    #[error("status channel closed for task {0}")]
    ChannelClosed(String),

    /// The task already produced its terminal classification.
    #[error("task {0} already reached a terminal state")]
    AlreadyTerminal(String),
}

impl TaskError {
    /// Returns `true` if this error is the task's terminal outcome rather
    /// than a protocol error.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, TaskError::Terminated { .. })
    }
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, TaskError>;
