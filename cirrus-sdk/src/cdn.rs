//! CDN API client
//!
//! The CDN product is global (no project/region scope) and synchronous.
//! Options come back as a nested struct of `enabled` + value pairs; absent
//! options inherit platform defaults.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdnResource {
    pub id: i64,
    pub cname: String,
    pub origin: String,
    pub active: bool,
    #[serde(default)]
    pub secondary_hostnames: Vec<String>,
    #[serde(default)]
    pub options: CdnOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CdnOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_cache_settings: Option<EdgeCacheSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gzip_on: Option<ToggleOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_header: Option<HostHeader>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeCacheSettings {
    pub enabled: bool,
    /// Cache lifetime like "10m" or "4h"
    pub default: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleOption {
    pub enabled: bool,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostHeader {
    pub enabled: bool,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCdnResourceRequest {
    pub cname: String,
    pub origin: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_hostnames: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<CdnOptions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCdnResourceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_hostnames: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<CdnOptions>,
}

#[derive(Debug, Clone)]
pub struct CdnClient {
    api: ApiClient,
}

impl CdnClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create_resource(&self, req: &CreateCdnResourceRequest) -> ApiResult<CdnResource> {
        self.api.post("/cdn/resources", req).await
    }

    pub async fn get_resource(&self, resource_id: i64) -> ApiResult<CdnResource> {
        self.api
            .get(&format!("/cdn/resources/{}", resource_id))
            .await
    }

    pub async fn update_resource(
        &self,
        resource_id: i64,
        req: &UpdateCdnResourceRequest,
    ) -> ApiResult<CdnResource> {
        self.api
            .patch(&format!("/cdn/resources/{}", resource_id), req)
            .await
    }

    pub async fn delete_resource(&self, resource_id: i64) -> ApiResult<()> {
        self.api
            .delete_empty(&format!("/cdn/resources/{}", resource_id))
            .await
    }
}
