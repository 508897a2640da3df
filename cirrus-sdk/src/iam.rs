//! IAM API client (projects and regions)
//!
//! Used by provider configuration to resolve a project name to its id and to
//! sanity-check the configured region.

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, ListResponse};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: u64,
    pub display_name: String,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IamClient {
    api: ApiClient,
}

impl IamClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        let resp: ListResponse<Project> = self.api.get("/v1/projects").await?;
        Ok(resp.results)
    }

    /// Resolve a project name to its id
    pub async fn project_by_name(&self, name: &str) -> ApiResult<Project> {
        self.list_projects()
            .await?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ApiError::NotFound(format!("project '{}'", name)))
    }

    pub async fn get_region(&self, region_id: u64) -> ApiResult<Region> {
        self.api.get(&format!("/v1/regions/{}", region_id)).await
    }
}
