//! Task states and status events reported by the cluster scheduler.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// State carried by a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    #[serde(rename = "TASK_STAGING")]
    Staging,
    #[serde(rename = "TASK_STARTING")]
    Starting,
    #[serde(rename = "TASK_RUNNING")]
    Running,
    #[serde(rename = "TASK_KILLING")]
    Killing,
    #[serde(rename = "TASK_FINISHED")]
    Finished,
    #[serde(rename = "TASK_KILLED")]
    Killed,
    #[serde(rename = "TASK_FAILED")]
    Failed,
    #[serde(rename = "TASK_LOST")]
    Lost,
    #[serde(rename = "TASK_ERROR")]
    Error,
    /// Any state this crate does not track.
    #[serde(rename = "TASK_UNKNOWN", other)]
    Other,
}

/// How a single status event affects the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not terminal; keep waiting.
    InFlight,
    /// Terminal without error.
    Succeeded,
    /// Terminal with the event's message as error.
    Failed,
}

impl TaskState {
    pub fn classify(self) -> Classification {
        match self {
            TaskState::Finished | TaskState::Killed => Classification::Succeeded,
            TaskState::Failed | TaskState::Lost | TaskState::Error => Classification::Failed,
            TaskState::Staging
            | TaskState::Starting
            | TaskState::Running
            | TaskState::Killing
            | TaskState::Other => Classification::InFlight,
        }
    }

    /// Returns `true` if no further transitions follow this state.
    pub fn is_terminal(self) -> bool {
        self.classify() != Classification::InFlight
    }

    /// Scheduler wire name, e.g. `TASK_RUNNING`.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Staging => "TASK_STAGING",
            TaskState::Starting => "TASK_STARTING",
            TaskState::Running => "TASK_RUNNING",
            TaskState::Killing => "TASK_KILLING",
            TaskState::Finished => "TASK_FINISHED",
            TaskState::Killed => "TASK_KILLED",
            TaskState::Failed => "TASK_FAILED",
            TaskState::Lost => "TASK_LOST",
            TaskState::Error => "TASK_ERROR",
            TaskState::Other => "TASK_UNKNOWN",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskState {
    type Err = Infallible;

    /// Accepts wire names (`TASK_RUNNING`) and short names (`running`).
    /// Unknown names parse as [`TaskState::Other`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("TASK_").unwrap_or(&upper);
        Ok(match name {
            "STAGING" => TaskState::Staging,
            "STARTING" => TaskState::Starting,
            "RUNNING" => TaskState::Running,
            "KILLING" => TaskState::Killing,
            "FINISHED" => TaskState::Finished,
            "KILLED" => TaskState::Killed,
            "FAILED" => TaskState::Failed,
            "LOST" => TaskState::Lost,
            "ERROR" => TaskState::Error,
            _ => TaskState::Other,
        })
    }
}

/// Status event for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: String,
    pub state: TaskState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl TaskStatus {
    pub fn new(task_id: impl Into<String>, state: TaskState) -> Self {
        Self {
            task_id: task_id.into(),
            state,
            message: None,
            agent_id: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Message text, empty when the scheduler sent none.
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}
