//! Object storage API client (buckets)

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub versioning_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBucketRequest {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    api: ApiClient,
    project_id: u64,
}

impl StorageClient {
    pub fn new(api: ApiClient, project_id: u64) -> Self {
        Self { api, project_id }
    }

    fn scoped(&self) -> String {
        format!("/v1/storage/{}/buckets", self.project_id)
    }

    pub async fn create_bucket(&self, req: &CreateBucketRequest) -> ApiResult<Bucket> {
        self.api.post(&self.scoped(), req).await
    }

    pub async fn get_bucket(&self, name: &str) -> ApiResult<Bucket> {
        self.api.get(&format!("{}/{}", self.scoped(), name)).await
    }

    pub async fn set_versioning(&self, name: &str, enabled: bool) -> ApiResult<Bucket> {
        self.api
            .patch(
                &format!("{}/{}", self.scoped(), name),
                &serde_json::json!({ "versioning_enabled": enabled }),
            )
            .await
    }

    pub async fn delete_bucket(&self, name: &str) -> ApiResult<()> {
        self.api
            .delete_empty(&format!("{}/{}", self.scoped(), name))
            .await
    }
}
