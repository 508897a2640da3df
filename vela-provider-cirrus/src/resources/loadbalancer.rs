//! Load balancer resource handlers

use std::collections::HashMap;

use cirrus_sdk::loadbalancers::{
    CreateLoadbalancerRequest, Listener, Loadbalancer, LoadbalancerClient,
};
use cirrus_sdk::{PollConfig, TasksClient, wait_for_task};
use vela_core::differ::attribute_changed;
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::loadbalancer::loadbalancer_schema;

use super::{api_error, opt_str, required_str, validate};

pub fn expand_create(attrs: &HashMap<String, Value>) -> ProviderResult<CreateLoadbalancerRequest> {
    let mut listeners = Vec::new();
    if let Some(items) = attrs.get("listeners").and_then(Value::as_list) {
        for item in items {
            let map = item
                .as_map()
                .ok_or_else(|| ProviderError::new("Listener must be a map"))?;
            listeners.push(Listener {
                id: None,
                name: required_str(map, "name")?.to_string(),
                protocol: required_str(map, "protocol")?.to_string(),
                protocol_port: map
                    .get("protocol_port")
                    .and_then(Value::as_int)
                    .ok_or_else(|| ProviderError::new("Listener requires a protocol_port"))?,
            });
        }
    }

    Ok(CreateLoadbalancerRequest {
        name: required_str(attrs, "name")?.to_string(),
        flavor: opt_str(attrs, "flavor"),
        listeners,
    })
}

pub fn flatten(lb: &Loadbalancer) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(lb.name.clone()));
    if let Some(ref flavor) = lb.flavor {
        attrs.insert("flavor".to_string(), Value::string(flavor.clone()));
    }
    if let Some(ref vip) = lb.vip_address {
        attrs.insert("vip_address".to_string(), Value::string(vip.clone()));
    }
    attrs.insert(
        "operating_status".to_string(),
        Value::string(lb.operating_status.clone()),
    );
    if !lb.listeners.is_empty() {
        let listeners = lb
            .listeners
            .iter()
            .map(|l| {
                let mut map = HashMap::new();
                map.insert("name".to_string(), Value::string(l.name.clone()));
                map.insert("protocol".to_string(), Value::string(l.protocol.clone()));
                map.insert("protocol_port".to_string(), Value::Int(l.protocol_port));
                Value::Map(map)
            })
            .collect();
        attrs.insert("listeners".to_string(), Value::List(listeners));
    }
    attrs
}

pub async fn create(
    loadbalancers: &LoadbalancerClient,
    tasks: &TasksClient,
    poll: PollConfig,
    resource: &Resource,
) -> ProviderResult<State> {
    validate(&loadbalancer_schema(), resource)?;
    let req = expand_create(&resource.attributes).map_err(|e| e.for_resource(resource.id.clone()))?;

    let response = loadbalancers
        .create(&req)
        .await
        .map_err(|e| api_error("create_loadbalancer", &resource.id, e))?;
    let task_id = response
        .first("create_loadbalancer")
        .map_err(|e| api_error("create_loadbalancer", &resource.id, e))?
        .to_string();

    let Some(lb_id) = wait_for_task(tasks, &task_id, true, poll, |task| {
        task.require_created_id("loadbalancers")
    })
    .await
    .map_err(|e| api_error("create_loadbalancer", &resource.id, e))?
    else {
        return Err(
            ProviderError::new("Create task finished without a loadbalancer id")
                .for_resource(resource.id.clone()),
        );
    };

    read(loadbalancers, &resource.id, &lb_id).await
}

pub async fn read(
    loadbalancers: &LoadbalancerClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    match loadbalancers.get(identifier).await {
        Ok(lb) => Ok(State::existing(id.clone(), flatten(&lb)).with_identifier(lb.id)),
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_loadbalancer", id, e)),
    }
}

/// Only the name moves in place; listener changes require replacement
pub async fn update(
    loadbalancers: &LoadbalancerClient,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    if attribute_changed("listeners", &to.attributes, &from.attributes) {
        return Err(ProviderError::new(
            "Listeners cannot be changed in place, delete and recreate",
        )
        .for_resource(id.clone()));
    }

    if attribute_changed("name", &to.attributes, &from.attributes) {
        let name = required_str(&to.attributes, "name").map_err(|e| e.for_resource(id.clone()))?;
        loadbalancers
            .rename(identifier, name)
            .await
            .map_err(|e| api_error("rename_loadbalancer", id, e))?;
    }

    read(loadbalancers, id, identifier).await
}

pub async fn delete(
    loadbalancers: &LoadbalancerClient,
    tasks: &TasksClient,
    poll: PollConfig,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let response = match loadbalancers.delete(identifier).await {
        Ok(r) => r,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(api_error("delete_loadbalancer", id, e)),
    };
    let task_id = response
        .first("delete_loadbalancer")
        .map_err(|e| api_error("delete_loadbalancer", id, e))?
        .to_string();

    wait_for_task(tasks, &task_id, true, poll, |_| Ok(()))
        .await
        .map_err(|e| api_error("delete_loadbalancer", id, e))?;

    match loadbalancers.get(identifier).await {
        Err(e) if e.is_not_found() => Ok(()),
        Ok(_) => Err(
            ProviderError::new("Loadbalancer still present after delete task finished")
                .for_resource(id.clone()),
        ),
        Err(e) => Err(api_error("get_loadbalancer", id, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listeners_round_trip() {
        let mut listener = HashMap::new();
        listener.insert("name".to_string(), Value::string("http"));
        listener.insert("protocol".to_string(), Value::string("HTTP"));
        listener.insert("protocol_port".to_string(), Value::Int(80));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::string("edge-lb"));
        attrs.insert("listeners".to_string(), Value::List(vec![Value::Map(listener)]));

        let req = expand_create(&attrs).unwrap();
        assert_eq!(req.listeners.len(), 1);

        let lb = Loadbalancer {
            id: "lb-1".to_string(),
            name: req.name.clone(),
            provisioning_status: "ACTIVE".to_string(),
            operating_status: "ONLINE".to_string(),
            vip_address: Some("203.0.113.7".to_string()),
            flavor: None,
            listeners: req.listeners.clone(),
        };
        let flattened = flatten(&lb);

        assert_eq!(flattened.get("name"), attrs.get("name"));
        assert_eq!(flattened.get("listeners"), attrs.get("listeners"));
        assert_eq!(
            flattened.get("vip_address"),
            Some(&Value::string("203.0.113.7"))
        );
    }
}
