//! Load balancer API client

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::task::TaskResponse;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loadbalancer {
    pub id: String,
    pub name: String,
    pub provisioning_status: String,
    pub operating_status: String,
    #[serde(default)]
    pub vip_address: Option<String>,
    #[serde(default)]
    pub flavor: Option<String>,
    #[serde(default)]
    pub listeners: Vec<Listener>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listener {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub protocol: String,
    pub protocol_port: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLoadbalancerRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub listeners: Vec<Listener>,
}

#[derive(Debug, Clone)]
pub struct LoadbalancerClient {
    api: ApiClient,
    project_id: u64,
    region_id: u64,
}

impl LoadbalancerClient {
    pub fn new(api: ApiClient, project_id: u64, region_id: u64) -> Self {
        Self {
            api,
            project_id,
            region_id,
        }
    }

    fn scoped(&self) -> String {
        format!("/v1/loadbalancers/{}/{}", self.project_id, self.region_id)
    }

    pub async fn create(&self, req: &CreateLoadbalancerRequest) -> ApiResult<TaskResponse> {
        self.api.post(&self.scoped(), req).await
    }

    pub async fn get(&self, loadbalancer_id: &str) -> ApiResult<Loadbalancer> {
        self.api
            .get(&format!("{}/{}", self.scoped(), loadbalancer_id))
            .await
    }

    pub async fn rename(&self, loadbalancer_id: &str, name: &str) -> ApiResult<Loadbalancer> {
        self.api
            .patch(
                &format!("{}/{}", self.scoped(), loadbalancer_id),
                &serde_json::json!({ "name": name }),
            )
            .await
    }

    pub async fn delete(&self, loadbalancer_id: &str) -> ApiResult<TaskResponse> {
        self.api
            .delete(&format!("{}/{}", self.scoped(), loadbalancer_id))
            .await
    }
}
