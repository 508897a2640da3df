//! Kubernetes API client (clusters and node pools)

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::task::TaskResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub version: String,
    pub status: String,
    #[serde(default)]
    pub fixed_network: Option<String>,
    #[serde(default)]
    pub fixed_subnet: Option<String>,
    #[serde(default)]
    pub pools: Vec<Pool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: String,
    pub name: String,
    pub flavor_id: String,
    pub min_node_count: i64,
    pub max_node_count: i64,
    #[serde(default)]
    pub node_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePoolRequest {
    pub name: String,
    pub flavor_id: String,
    pub min_node_count: i64,
    pub max_node_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePoolRequest {
    pub min_node_count: i64,
    pub max_node_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClusterRequest {
    pub name: String,
    pub version: String,
    pub fixed_network: String,
    pub fixed_subnet: String,
    pub pools: Vec<CreatePoolRequest>,
}

#[derive(Debug, Clone)]
pub struct K8sClient {
    api: ApiClient,
    project_id: u64,
    region_id: u64,
}

impl K8sClient {
    pub fn new(api: ApiClient, project_id: u64, region_id: u64) -> Self {
        Self {
            api,
            project_id,
            region_id,
        }
    }

    fn scoped(&self) -> String {
        format!("/v1/k8s/clusters/{}/{}", self.project_id, self.region_id)
    }

    pub async fn create_cluster(&self, req: &CreateClusterRequest) -> ApiResult<TaskResponse> {
        self.api.post(&self.scoped(), req).await
    }

    pub async fn get_cluster(&self, cluster_id: &str) -> ApiResult<Cluster> {
        self.api
            .get(&format!("{}/{}", self.scoped(), cluster_id))
            .await
    }

    pub async fn delete_cluster(&self, cluster_id: &str) -> ApiResult<TaskResponse> {
        self.api
            .delete(&format!("{}/{}", self.scoped(), cluster_id))
            .await
    }

    pub async fn create_pool(
        &self,
        cluster_id: &str,
        req: &CreatePoolRequest,
    ) -> ApiResult<TaskResponse> {
        self.api
            .post(&format!("{}/{}/pools", self.scoped(), cluster_id), req)
            .await
    }

    /// Node count bounds change in place; flavor changes require pool
    /// replacement and are handled by callers as delete + create.
    pub async fn update_pool(
        &self,
        cluster_id: &str,
        pool_id: &str,
        req: &UpdatePoolRequest,
    ) -> ApiResult<Pool> {
        self.api
            .patch(
                &format!("{}/{}/pools/{}", self.scoped(), cluster_id, pool_id),
                req,
            )
            .await
    }

    pub async fn delete_pool(&self, cluster_id: &str, pool_id: &str) -> ApiResult<TaskResponse> {
        self.api
            .delete(&format!("{}/{}/pools/{}", self.scoped(), cluster_id, pool_id))
            .await
    }
}
