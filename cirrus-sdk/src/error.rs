//! Error types for the Cirrus API clients

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the product API clients
#[derive(Debug, Error)]
pub enum ApiError {
    /// The requested entity does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication or authorization failure (HTTP 401/403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Any other non-success HTTP status
    #[error("{method} {path} returned HTTP {status}: {message}")]
    Http {
        status: u16,
        method: String,
        path: String,
        message: String,
    },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape
    #[error("Failed to decode response from {path}: {detail}")]
    Decode { path: String, detail: String },

    /// A request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    /// An asynchronous task finished in the error state
    #[error("Task {task_id} failed: {detail}")]
    TaskFailed { task_id: String, detail: String },

    /// An asynchronous task did not reach a terminal state in time
    #[error("Task {task_id} did not finish within {timeout:?}")]
    TaskTimeout { task_id: String, timeout: Duration },

    /// A mutating call that should have produced a task returned none
    #[error("No task id returned by {0}")]
    MissingTask(String),
}

impl ApiError {
    /// Read and delete handlers treat NotFound as "already gone"
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
