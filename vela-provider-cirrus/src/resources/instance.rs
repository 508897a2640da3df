//! Instance resource handlers

use std::collections::HashMap;

use cirrus_sdk::compute::{
    ComputeClient, CreateInstanceRequest, Instance, InstanceVolumeSpec, InterfaceSpec,
};
use cirrus_sdk::{PollConfig, TasksClient, wait_for_task};
use vela_core::differ::attribute_changed;
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::compute::instance_schema;

use super::{
    api_error, opt_int, opt_str, required_str, string_list, string_map, validate,
    value_string_list, value_string_map,
};

const DEFAULT_BOOT_VOLUME_SIZE: i64 = 20;

/// Build the create request from the attribute map
pub fn expand_create(attrs: &HashMap<String, Value>) -> ProviderResult<CreateInstanceRequest> {
    let mut interfaces: Vec<InterfaceSpec> = Vec::new();
    if let Some(items) = attrs.get("interfaces").and_then(Value::as_list) {
        for item in items {
            let map = item
                .as_map()
                .ok_or_else(|| ProviderError::new("Interface must be a map"))?;
            interfaces.push(InterfaceSpec {
                iface_type: required_str(map, "type")?.to_string(),
                network_id: opt_str(map, "network_id"),
                subnet_id: opt_str(map, "subnet_id"),
            });
        }
    }
    // Instances without declared interfaces get a public one
    if interfaces.is_empty() {
        interfaces.push(InterfaceSpec {
            iface_type: "external".to_string(),
            network_id: None,
            subnet_id: None,
        });
    }

    let boot_volume = InstanceVolumeSpec {
        source: "image".to_string(),
        size: opt_int(attrs, "boot_volume_size").unwrap_or(DEFAULT_BOOT_VOLUME_SIZE),
        image_id: Some(required_str(attrs, "image_id")?.to_string()),
        type_name: opt_str(attrs, "boot_volume_type"),
        boot_index: 0,
    };

    Ok(CreateInstanceRequest {
        name: required_str(attrs, "name")?.to_string(),
        flavor_id: required_str(attrs, "flavor_id")?.to_string(),
        interfaces,
        volumes: vec![boot_volume],
        keypair_name: opt_str(attrs, "keypair_name"),
        metadata: string_map(attrs, "metadata"),
        security_groups: string_list(attrs, "security_groups"),
    })
}

/// Map the backend instance into the attribute map
pub fn flatten(instance: &Instance) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(instance.name.clone()));
    attrs.insert(
        "flavor_id".to_string(),
        Value::string(instance.flavor_id.clone()),
    );
    attrs.insert("status".to_string(), Value::string(instance.status.clone()));
    if !instance.addresses.is_empty() {
        attrs.insert(
            "addresses".to_string(),
            value_string_list(&instance.addresses),
        );
    }
    if !instance.metadata.is_empty() {
        attrs.insert("metadata".to_string(), value_string_map(&instance.metadata));
    }
    if !instance.security_groups.is_empty() {
        attrs.insert(
            "security_groups".to_string(),
            value_string_list(&instance.security_groups),
        );
    }
    attrs
}

pub async fn create(
    compute: &ComputeClient,
    tasks: &TasksClient,
    poll: PollConfig,
    resource: &Resource,
) -> ProviderResult<State> {
    validate(&instance_schema(), resource)?;
    let req = expand_create(&resource.attributes).map_err(|e| e.for_resource(resource.id.clone()))?;

    let response = compute
        .create_instance(&req)
        .await
        .map_err(|e| api_error("create_instance", &resource.id, e))?;
    let task_id = response
        .first("create_instance")
        .map_err(|e| api_error("create_instance", &resource.id, e))?
        .to_string();

    let Some(instance_id) = wait_for_task(tasks, &task_id, true, poll, |task| {
        task.require_created_id("instances")
    })
    .await
    .map_err(|e| api_error("create_instance", &resource.id, e))?
    else {
        return Err(
            ProviderError::new("Create task finished without an instance id")
                .for_resource(resource.id.clone()),
        );
    };

    read(compute, &resource.id, &instance_id).await
}

pub async fn read(
    compute: &ComputeClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    match compute.get_instance(identifier).await {
        Ok(instance) => {
            Ok(State::existing(id.clone(), flatten(&instance)).with_identifier(instance.id))
        }
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_instance", id, e)),
    }
}

/// Rename and metadata are separate backend calls; each changed group is
/// committed independently and the final read reports what actually landed.
pub async fn update(
    compute: &ComputeClient,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    if attribute_changed("name", &to.attributes, &from.attributes) {
        let name = required_str(&to.attributes, "name").map_err(|e| e.for_resource(id.clone()))?;
        compute
            .rename_instance(identifier, name)
            .await
            .map_err(|e| api_error("rename_instance", id, e))?;
    }

    if attribute_changed("metadata", &to.attributes, &from.attributes) {
        let metadata = string_map(&to.attributes, "metadata");
        compute
            .set_instance_metadata(identifier, &metadata)
            .await
            .map_err(|e| api_error("set_instance_metadata", id, e))?;
    }

    read(compute, id, identifier).await
}

pub async fn delete(
    compute: &ComputeClient,
    tasks: &TasksClient,
    poll: PollConfig,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let response = match compute.delete_instance(identifier).await {
        Ok(r) => r,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(api_error("delete_instance", id, e)),
    };
    let task_id = response
        .first("delete_instance")
        .map_err(|e| api_error("delete_instance", id, e))?
        .to_string();

    wait_for_task(tasks, &task_id, true, poll, |_| Ok(()))
        .await
        .map_err(|e| api_error("delete_instance", id, e))?;

    // Deletion is confirmed by the resource being gone, not by the task
    match compute.get_instance(identifier).await {
        Err(e) if e.is_not_found() => Ok(()),
        Ok(_) => Err(
            ProviderError::new("Instance still present after delete task finished")
                .for_resource(id.clone()),
        ),
        Err(e) => Err(api_error("get_instance", id, e)),
    }
}
