//! Asynchronous task state.

use serde::{Deserialize, Serialize};

/// State of a long-running server-side operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    Waiting,
    Running,
    Succeeded,
    Failed,
}

impl TaskState {
    /// The task will not change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }
}

/// Task descriptor returned in the response envelope of asynchronous
/// operations and by the task-status route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    pub state: TaskState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}
