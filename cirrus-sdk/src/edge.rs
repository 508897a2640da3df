//! Edge apps API client
//!
//! Edge apps run compiled binaries at the platform's edge locations. The
//! product is global and synchronous.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeApp {
    pub id: i64,
    pub name: String,
    pub status: String,
    pub binary_id: i64,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEdgeAppRequest {
    pub name: String,
    pub binary_id: i64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateEdgeAppRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EdgeClient {
    api: ApiClient,
}

impl EdgeClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create_app(&self, req: &CreateEdgeAppRequest) -> ApiResult<EdgeApp> {
        self.api.post("/v1/edge/apps", req).await
    }

    pub async fn get_app(&self, app_id: i64) -> ApiResult<EdgeApp> {
        self.api.get(&format!("/v1/edge/apps/{}", app_id)).await
    }

    pub async fn update_app(&self, app_id: i64, req: &UpdateEdgeAppRequest) -> ApiResult<EdgeApp> {
        self.api
            .patch(&format!("/v1/edge/apps/{}", app_id), req)
            .await
    }

    pub async fn delete_app(&self, app_id: i64) -> ApiResult<()> {
        self.api
            .delete_empty(&format!("/v1/edge/apps/{}", app_id))
            .await
    }
}
