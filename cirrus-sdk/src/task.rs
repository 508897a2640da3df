//! Asynchronous task model and the generic completion poller
//!
//! Mutating calls on asynchronous products answer with task ids. A task
//! moves from `running` to exactly one terminal state (`success` or
//! `error`) and never reverts; the poller stops at the first terminal
//! observation.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{ApiError, ApiResult};
use crate::tasks::TasksClient;

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Running,
    Success,
    Error,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Success | TaskState::Error)
    }
}

/// An asynchronous operation handle returned by a mutating API call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub state: TaskState,
    /// Error detail, set when state is `error`
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished: Option<DateTime<Utc>>,
    /// Ids of resources this task created, keyed by kind
    /// (e.g., `{"instances": ["..."], "volumes": ["..."]}`)
    #[serde(default)]
    pub created_resources: Option<HashMap<String, Vec<String>>>,
}

impl Task {
    /// First created id of the given kind, if the finished task reports one
    pub fn first_created_id(&self, kind: &str) -> Option<&str> {
        self.created_resources
            .as_ref()
            .and_then(|m| m.get(kind))
            .and_then(|ids| ids.first())
            .map(String::as_str)
    }

    /// Extractor for the common "one created resource of kind X" case
    pub fn require_created_id(&self, kind: &str) -> ApiResult<String> {
        self.first_created_id(kind)
            .map(String::from)
            .ok_or_else(|| ApiError::Decode {
                path: format!("/v1/tasks/{}", self.id),
                detail: format!("finished task carries no created {}", kind),
            })
    }
}

/// Response envelope for mutating calls on asynchronous products
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub tasks: Vec<String>,
}

impl TaskResponse {
    /// The single task id expected from most mutating calls
    pub fn first(&self, operation: &str) -> ApiResult<&str> {
        self.tasks
            .first()
            .map(String::as_str)
            .ok_or_else(|| ApiError::MissingTask(operation.to_string()))
    }
}

/// Poll cadence and budget for one wait
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollConfig {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Cadence used by handlers unless a resource needs a larger budget
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeout,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::with_timeout(Duration::from_secs(300))
    }
}

/// Poll a task to completion and extract a typed result
///
/// - terminal success: `extract` is invoked exactly once and its result
///   returned as `Some`
/// - terminal error: `TaskFailed` when `fail_on_error`, otherwise `Ok(None)`
/// - no terminal state before the deadline: `TaskTimeout`
///
/// Neither failure nor timeout is retried here; re-running the operation is
/// the caller's decision. Delete flows usually pass a unit extractor and
/// confirm disappearance with a follow-up get, treating `NotFound` as done.
pub async fn wait_for_task<T, F>(
    tasks: &TasksClient,
    task_id: &str,
    fail_on_error: bool,
    poll: PollConfig,
    extract: F,
) -> ApiResult<Option<T>>
where
    F: FnOnce(&Task) -> ApiResult<T>,
{
    let deadline = Instant::now() + poll.timeout;

    loop {
        let task = tasks.get(task_id).await?;

        match task.state {
            TaskState::Success => {
                log::debug!("task {} finished", task_id);
                return extract(&task).map(Some);
            }
            TaskState::Error => {
                log::warn!("task {} failed: {:?}", task_id, task.error);
                if fail_on_error {
                    return Err(ApiError::TaskFailed {
                        task_id: task_id.to_string(),
                        detail: task.error.unwrap_or_else(|| "no detail".to_string()),
                    });
                }
                return Ok(None);
            }
            TaskState::Running => {
                if Instant::now() + poll.interval > deadline {
                    return Err(ApiError::TaskTimeout {
                        task_id: task_id.to_string(),
                        timeout: poll.timeout,
                    });
                }
                tokio::time::sleep(poll.interval).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_state_deserializes_lowercase() {
        let task: Task = serde_json::from_str(
            r#"{"id": "t-1", "state": "success", "created_resources": {"instances": ["i-1"]}}"#,
        )
        .unwrap();
        assert_eq!(task.state, TaskState::Success);
        assert_eq!(task.first_created_id("instances"), Some("i-1"));
        assert!(task.first_created_id("volumes").is_none());
    }

    #[test]
    fn terminal_states() {
        assert!(TaskState::Success.is_terminal());
        assert!(TaskState::Error.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }

    #[test]
    fn empty_task_response_is_an_error() {
        let resp = TaskResponse { tasks: vec![] };
        assert!(resp.first("create_instance").is_err());

        let resp = TaskResponse {
            tasks: vec!["t-1".to_string()],
        };
        assert_eq!(resp.first("create_instance").unwrap(), "t-1");
    }

    #[test]
    fn require_created_id_reports_kind() {
        let task: Task = serde_json::from_str(r#"{"id": "t-2", "state": "success"}"#).unwrap();
        let err = task.require_created_id("loadbalancers").unwrap_err();
        assert!(err.to_string().contains("loadbalancers"));
    }
}
