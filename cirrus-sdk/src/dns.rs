//! DNS API client (zones and record sets)
//!
//! Zones are keyed by name rather than a generated id, and the product API
//! is synchronous.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    #[serde(default)]
    pub serial: Option<u64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateZoneRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub content: String,
}

/// A record set: all records of one type under one name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rrset {
    pub ttl: i64,
    pub records: Vec<ResourceRecord>,
}

#[derive(Debug, Clone)]
pub struct DnsClient {
    api: ApiClient,
}

impl DnsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn create_zone(&self, name: &str) -> ApiResult<Zone> {
        self.api
            .post(
                "/v2/zones",
                &CreateZoneRequest {
                    name: name.to_string(),
                },
            )
            .await
    }

    pub async fn get_zone(&self, name: &str) -> ApiResult<Zone> {
        self.api.get(&format!("/v2/zones/{}", name)).await
    }

    pub async fn delete_zone(&self, name: &str) -> ApiResult<()> {
        self.api.delete_empty(&format!("/v2/zones/{}", name)).await
    }

    pub async fn get_rrset(&self, zone: &str, name: &str, rrset_type: &str) -> ApiResult<Rrset> {
        self.api
            .get(&format!("/v2/zones/{}/{}/{}", zone, name, rrset_type))
            .await
    }

    /// Create or replace the record set; the API upserts on PUT
    pub async fn put_rrset(
        &self,
        zone: &str,
        name: &str,
        rrset_type: &str,
        rrset: &Rrset,
    ) -> ApiResult<Rrset> {
        self.api
            .put(&format!("/v2/zones/{}/{}/{}", zone, name, rrset_type), rrset)
            .await
    }

    pub async fn delete_rrset(&self, zone: &str, name: &str, rrset_type: &str) -> ApiResult<()> {
        self.api
            .delete_empty(&format!("/v2/zones/{}/{}/{}", zone, name, rrset_type))
            .await
    }
}
