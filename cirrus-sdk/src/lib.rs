//! Cirrus SDK
//!
//! Thin REST clients for the Cirrus cloud platform, one module per product
//! (compute, load balancers, CDN, DNS, Kubernetes, security, storage, edge
//! apps, WAAP, IAM). All clients share an [`ApiClient`] that signs requests
//! with the permanent API token, retries transient server errors, and maps
//! HTTP 404 to [`ApiError::NotFound`].
//!
//! Mutating calls on asynchronous products return task ids; callers poll
//! them to completion with [`task::wait_for_task`].

pub mod cdn;
pub mod client;
pub mod compute;
pub mod dns;
pub mod edge;
pub mod error;
pub mod iam;
pub mod k8s;
pub mod loadbalancers;
pub mod security;
pub mod storage;
pub mod task;
pub mod tasks;
pub mod waap;

pub use client::{ApiClient, ListResponse};
pub use error::{ApiError, ApiResult};
pub use task::{PollConfig, Task, TaskResponse, TaskState, wait_for_task};
pub use tasks::TasksClient;
