//! Volume resource handlers

use std::collections::HashMap;

use cirrus_sdk::compute::{ComputeClient, CreateVolumeRequest, Volume};
use cirrus_sdk::{PollConfig, TasksClient, wait_for_task};
use vela_core::differ::attribute_changed;
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::compute::volume_schema;

use super::{api_error, opt_int, opt_str, required_str, validate};

pub fn expand_create(attrs: &HashMap<String, Value>) -> ProviderResult<CreateVolumeRequest> {
    let image_id = opt_str(attrs, "image_id");
    Ok(CreateVolumeRequest {
        name: required_str(attrs, "name")?.to_string(),
        size: opt_int(attrs, "size")
            .ok_or_else(|| ProviderError::new("Missing required attribute 'size'"))?,
        source: if image_id.is_some() {
            "image".to_string()
        } else {
            "new-volume".to_string()
        },
        type_name: opt_str(attrs, "type_name"),
        image_id,
    })
}

pub fn flatten(volume: &Volume) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(volume.name.clone()));
    attrs.insert("size".to_string(), Value::Int(volume.size));
    attrs.insert(
        "type_name".to_string(),
        Value::string(volume.volume_type.clone()),
    );
    attrs.insert("status".to_string(), Value::string(volume.status.clone()));
    if let Some(ref instance_id) = volume.instance_id {
        attrs.insert(
            "instance_id".to_string(),
            Value::string(instance_id.clone()),
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
    validate(&volume_schema(), resource)?;
    let req = expand_create(&resource.attributes).map_err(|e| e.for_resource(resource.id.clone()))?;

    let response = compute
        .create_volume(&req)
        .await
        .map_err(|e| api_error("create_volume", &resource.id, e))?;
    let task_id = response
        .first("create_volume")
        .map_err(|e| api_error("create_volume", &resource.id, e))?
        .to_string();

    let Some(volume_id) = wait_for_task(tasks, &task_id, true, poll, |task| {
        task.require_created_id("volumes")
    })
    .await
    .map_err(|e| api_error("create_volume", &resource.id, e))?
    else {
        return Err(ProviderError::new("Create task finished without a volume id")
            .for_resource(resource.id.clone()));
    };

    read(compute, &resource.id, &volume_id).await
}

pub async fn read(
    compute: &ComputeClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    match compute.get_volume(identifier).await {
        Ok(volume) => Ok(State::existing(id.clone(), flatten(&volume)).with_identifier(volume.id)),
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_volume", id, e)),
    }
}

pub async fn update(
    compute: &ComputeClient,
    tasks: &TasksClient,
    poll: PollConfig,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    if attribute_changed("name", &to.attributes, &from.attributes) {
        let name = required_str(&to.attributes, "name").map_err(|e| e.for_resource(id.clone()))?;
        compute
            .rename_volume(identifier, name)
            .await
            .map_err(|e| api_error("rename_volume", id, e))?;
    }

    if attribute_changed("size", &to.attributes, &from.attributes) {
        let desired = opt_int(&to.attributes, "size")
            .ok_or_else(|| ProviderError::new("size must be an integer").for_resource(id.clone()))?;
        let current = opt_int(&from.attributes, "size").unwrap_or(0);
        if desired < current {
            return Err(ProviderError::new(format!(
                "Volumes cannot shrink ({} -> {} GiB)",
                current, desired
            ))
            .for_resource(id.clone()));
        }
        let response = compute
            .extend_volume(identifier, desired)
            .await
            .map_err(|e| api_error("extend_volume", id, e))?;
        let task_id = response
            .first("extend_volume")
            .map_err(|e| api_error("extend_volume", id, e))?
            .to_string();
        wait_for_task(tasks, &task_id, true, poll, |_| Ok(()))
            .await
            .map_err(|e| api_error("extend_volume", id, e))?;
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
    let response = match compute.delete_volume(identifier).await {
        Ok(r) => r,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(api_error("delete_volume", id, e)),
    };
    let task_id = response
        .first("delete_volume")
        .map_err(|e| api_error("delete_volume", id, e))?
        .to_string();

    wait_for_task(tasks, &task_id, true, poll, |_| Ok(()))
        .await
        .map_err(|e| api_error("delete_volume", id, e))?;

    match compute.get_volume(identifier).await {
        Err(e) if e.is_not_found() => Ok(()),
        Ok(_) => Err(
            ProviderError::new("Volume still present after delete task finished")
                .for_resource(id.clone()),
        ),
        Err(e) => Err(api_error("get_volume", id, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_follows_image_presence() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::string("data"));
        attrs.insert("size".to_string(), Value::Int(50));

        let req = expand_create(&attrs).unwrap();
        assert_eq!(req.source, "new-volume");

        attrs.insert("image_id".to_string(), Value::string("img-1"));
        let req = expand_create(&attrs).unwrap();
        assert_eq!(req.source, "image");
        assert_eq!(req.image_id.as_deref(), Some("img-1"));
    }

    #[test]
    fn flatten_reports_owned_fields() {
        let volume = Volume {
            id: "v-1".to_string(),
            name: "data".to_string(),
            size: 50,
            volume_type: "ssd".to_string(),
            status: "available".to_string(),
            instance_id: None,
        };
        let attrs = flatten(&volume);
        assert_eq!(attrs.get("name"), Some(&Value::string("data")));
        assert_eq!(attrs.get("size"), Some(&Value::Int(50)));
        assert!(!attrs.contains_key("instance_id"));
    }
}
