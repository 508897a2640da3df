//! Compute API client (instances, volumes, flavors, images)

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, ListResponse};
use crate::error::{ApiError, ApiResult};
use crate::task::TaskResponse;

// ---------------------------------------------------------------------------
// Instances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub status: String,
    pub flavor_id: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub security_groups: Vec<String>,
    #[serde(default)]
    pub volume_ids: Vec<String>,
}

/// Network attachment requested for a new instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceSpec {
    /// "external" or "subnet"
    #[serde(rename = "type")]
    pub iface_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
}

/// Boot volume requested for a new instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceVolumeSpec {
    pub source: String,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub boot_index: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInstanceRequest {
    pub name: String,
    pub flavor_id: String,
    pub interfaces: Vec<InterfaceSpec>,
    pub volumes: Vec<InstanceVolumeSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keypair_name: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenameInstanceRequest {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Volumes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub size: i64,
    pub volume_type: String,
    pub status: String,
    #[serde(default)]
    pub instance_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVolumeRequest {
    pub name: String,
    pub size: i64,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtendVolumeRequest {
    pub size: i64,
}

// ---------------------------------------------------------------------------
// Flavors and images
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flavor {
    pub flavor_id: String,
    pub flavor_name: String,
    pub vcpus: i64,
    pub ram: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub os_distro: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub min_disk: Option<i64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the compute product, scoped to one project and region
#[derive(Debug, Clone)]
pub struct ComputeClient {
    api: ApiClient,
    project_id: u64,
    region_id: u64,
}

impl ComputeClient {
    pub fn new(api: ApiClient, project_id: u64, region_id: u64) -> Self {
        Self {
            api,
            project_id,
            region_id,
        }
    }

    fn scoped(&self, product: &str) -> String {
        format!("/v1/{}/{}/{}", product, self.project_id, self.region_id)
    }

    // Instances

    pub async fn create_instance(&self, req: &CreateInstanceRequest) -> ApiResult<TaskResponse> {
        self.api.post(&self.scoped("instances"), req).await
    }

    pub async fn get_instance(&self, instance_id: &str) -> ApiResult<Instance> {
        self.api
            .get(&format!("{}/{}", self.scoped("instances"), instance_id))
            .await
    }

    pub async fn rename_instance(&self, instance_id: &str, name: &str) -> ApiResult<Instance> {
        self.api
            .patch(
                &format!("{}/{}", self.scoped("instances"), instance_id),
                &RenameInstanceRequest {
                    name: name.to_string(),
                },
            )
            .await
    }

    /// Replace instance metadata wholesale
    pub async fn set_instance_metadata(
        &self,
        instance_id: &str,
        metadata: &HashMap<String, String>,
    ) -> ApiResult<()> {
        let _: serde_json::Value = self
            .api
            .put(
                &format!("{}/{}/metadata", self.scoped("instances"), instance_id),
                metadata,
            )
            .await?;
        Ok(())
    }

    pub async fn delete_instance(&self, instance_id: &str) -> ApiResult<TaskResponse> {
        self.api
            .delete(&format!("{}/{}", self.scoped("instances"), instance_id))
            .await
    }

    // Volumes

    pub async fn create_volume(&self, req: &CreateVolumeRequest) -> ApiResult<TaskResponse> {
        self.api.post(&self.scoped("volumes"), req).await
    }

    pub async fn get_volume(&self, volume_id: &str) -> ApiResult<Volume> {
        self.api
            .get(&format!("{}/{}", self.scoped("volumes"), volume_id))
            .await
    }

    pub async fn rename_volume(&self, volume_id: &str, name: &str) -> ApiResult<Volume> {
        self.api
            .patch(
                &format!("{}/{}", self.scoped("volumes"), volume_id),
                &serde_json::json!({ "name": name }),
            )
            .await
    }

    /// Grow a volume; shrinking is not supported by the backend
    pub async fn extend_volume(&self, volume_id: &str, size: i64) -> ApiResult<TaskResponse> {
        self.api
            .post(
                &format!("{}/{}/extend", self.scoped("volumes"), volume_id),
                &ExtendVolumeRequest { size },
            )
            .await
    }

    pub async fn delete_volume(&self, volume_id: &str) -> ApiResult<TaskResponse> {
        self.api
            .delete(&format!("{}/{}", self.scoped("volumes"), volume_id))
            .await
    }

    // Flavors and images (read-only)

    pub async fn list_flavors(&self) -> ApiResult<Vec<Flavor>> {
        let resp: ListResponse<Flavor> = self.api.get(&self.scoped("flavors")).await?;
        Ok(resp.results)
    }

    pub async fn flavor_by_name(&self, name: &str) -> ApiResult<Flavor> {
        self.list_flavors()
            .await?
            .into_iter()
            .find(|f| f.flavor_name == name)
            .ok_or_else(|| ApiError::NotFound(format!("flavor '{}'", name)))
    }

    pub async fn list_images(&self) -> ApiResult<Vec<Image>> {
        let resp: ListResponse<Image> = self.api.get(&self.scoped("images")).await?;
        Ok(resp.results)
    }

    pub async fn image_by_name(&self, name: &str) -> ApiResult<Image> {
        self.list_images()
            .await?
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| ApiError::NotFound(format!("image '{}'", name)))
    }
}
