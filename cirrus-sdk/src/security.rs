//! Security group API client
//!
//! Security groups are synchronous: mutating calls return the entity
//! directly, no task is involved. Rules are managed one by one after group
//! creation, which is why update handlers diff rule sets.

use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::ApiResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub security_group_rules: Vec<SecurityGroupRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroupRule {
    pub id: String,
    pub direction: String,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub port_range_min: Option<i64>,
    #[serde(default)]
    pub port_range_max: Option<i64>,
    #[serde(default)]
    pub remote_ip_prefix: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Rule shape used on create; the backend assigns the id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub direction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_range_max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSecurityGroupRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub security_group_rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateSecurityGroupRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SecurityGroupClient {
    api: ApiClient,
    project_id: u64,
    region_id: u64,
}

impl SecurityGroupClient {
    pub fn new(api: ApiClient, project_id: u64, region_id: u64) -> Self {
        Self {
            api,
            project_id,
            region_id,
        }
    }

    fn scoped(&self) -> String {
        format!("/v1/securitygroups/{}/{}", self.project_id, self.region_id)
    }

    pub async fn create(&self, req: &CreateSecurityGroupRequest) -> ApiResult<SecurityGroup> {
        self.api.post(&self.scoped(), req).await
    }

    pub async fn get(&self, group_id: &str) -> ApiResult<SecurityGroup> {
        self.api
            .get(&format!("{}/{}", self.scoped(), group_id))
            .await
    }

    pub async fn update(
        &self,
        group_id: &str,
        req: &UpdateSecurityGroupRequest,
    ) -> ApiResult<SecurityGroup> {
        self.api
            .patch(&format!("{}/{}", self.scoped(), group_id), req)
            .await
    }

    pub async fn delete(&self, group_id: &str) -> ApiResult<()> {
        self.api
            .delete_empty(&format!("{}/{}", self.scoped(), group_id))
            .await
    }

    pub async fn add_rule(&self, group_id: &str, rule: &RuleSpec) -> ApiResult<SecurityGroupRule> {
        self.api
            .post(&format!("{}/{}/rules", self.scoped(), group_id), rule)
            .await
    }

    pub async fn delete_rule(&self, rule_id: &str) -> ApiResult<()> {
        self.api
            .delete_empty(&format!(
                "/v1/securitygrouprules/{}/{}/{}",
                self.project_id, self.region_id, rule_id
            ))
            .await
    }
}
