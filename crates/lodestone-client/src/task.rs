//! Handles for long-running server-side operations.
//!
//! Asynchronous routes return immediately with a task reference; the caller
//! polls `task/status` until the task reaches a terminal state.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use lodestone_core::error::{LodestoneError, Result};
use lodestone_core::models::{Space, TaskState, TaskStatus};

use crate::transport::ApiTransport;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// A reference to a long-running server-side operation.
pub struct Task {
    transport: Arc<dyn ApiTransport>,
    pub task_id: String,
    pub state: TaskState,
    pub message: Option<String>,
    space: Option<Space>,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("task_id", &self.task_id)
            .field("state", &self.state)
            .field("message", &self.message)
            .field("space", &self.space)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskStatusRequest<'a> {
    task_id: &'a str,
}

impl Task {
    /// Build a task from the status half of a response envelope.
    pub(crate) fn from_status(
        transport: Arc<dyn ApiTransport>,
        status: TaskStatus,
        space: Option<Space>,
    ) -> Result<Self> {
        let task_id = status.task_id.ok_or_else(|| LodestoneError::Api {
            status: 200,
            message: "asynchronous response carried no task id".to_string(),
        })?;

        Ok(Self {
            transport,
            task_id,
            state: status.state,
            message: status.status_message,
            space,
        })
    }

    /// Attach to a task by id without knowing its current state.
    pub(crate) fn attach(
        transport: Arc<dyn ApiTransport>,
        task_id: String,
        space: Option<Space>,
    ) -> Self {
        Self {
            transport,
            task_id,
            state: TaskState::Waiting,
            message: None,
            space,
        }
    }

    /// Fetch the task's current state from the server.
    pub async fn refresh(&mut self) -> Result<TaskState> {
        let req = TaskStatusRequest {
            task_id: &self.task_id,
        };
        let body = serde_json::to_value(&req)?;
        let envelope = self
            .transport
            .post("task/status", body, self.space.as_ref())
            .await?;

        let http_status = envelope.http_status;
        let status = envelope.status.ok_or_else(|| LodestoneError::Api {
            status: http_status,
            message: "task status response carried no status".to_string(),
        })?;

        self.state = status.state;
        self.message = status.status_message;
        Ok(self.state)
    }

    /// Poll until the task completes, with default interval and deadline.
    pub async fn wait(&mut self) -> Result<()> {
        self.wait_with(DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT).await
    }

    /// Poll until the task completes.
    ///
    /// Returns `TaskFailed` if the server reports failure and `TaskTimeout`
    /// when the deadline passes first.
    pub async fn wait_with(&mut self, poll_interval: Duration, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            match self.state {
                TaskState::Succeeded => return Ok(()),
                TaskState::Failed => {
                    return Err(LodestoneError::TaskFailed {
                        task_id: self.task_id.clone(),
                        message: self.message.clone().unwrap_or_default(),
                    })
                }
                TaskState::Waiting | TaskState::Running => {}
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(LodestoneError::TaskTimeout {
                    task_id: self.task_id.clone(),
                });
            }

            tokio::time::sleep(poll_interval).await;
            self.refresh().await?;
        }
    }
}
