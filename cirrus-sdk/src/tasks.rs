//! Tasks API client

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::task::Task;

/// Client for the tasks endpoint
#[derive(Debug, Clone)]
pub struct TasksClient {
    api: ApiClient,
}

impl TasksClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Fetch the current status of a task
    pub async fn get(&self, task_id: &str) -> ApiResult<Task> {
        self.api.get(&format!("/v1/tasks/{}", task_id)).await
    }
}
