//! WAAP API client (web application and API protection domains)

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaapDomain {
    pub id: i64,
    pub name: String,
    /// "active", "monitor" or "bypass"
    pub status: String,
    #[serde(default)]
    pub api_discovery_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWaapDomainRequest {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateWaapDomainRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_discovery_enabled: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct WaapClient {
    api: ApiClient,
}

impl WaapClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create_domain(&self, req: &CreateWaapDomainRequest) -> ApiResult<WaapDomain> {
        self.api.post("/v1/waap/domains", req).await
    }

    pub async fn get_domain(&self, domain_id: i64) -> ApiResult<WaapDomain> {
        self.api.get(&format!("/v1/waap/domains/{}", domain_id)).await
    }

    pub async fn update_domain(
        &self,
        domain_id: i64,
        req: &UpdateWaapDomainRequest,
    ) -> ApiResult<WaapDomain> {
        self.api
            .patch(&format!("/v1/waap/domains/{}", domain_id), req)
            .await
    }

    pub async fn delete_domain(&self, domain_id: i64) -> ApiResult<()> {
        self.api
            .delete_empty(&format!("/v1/waap/domains/{}", domain_id))
            .await
    }
}
