//! WAAP domain resource handlers

use std::collections::HashMap;

use cirrus_sdk::waap::{CreateWaapDomainRequest, UpdateWaapDomainRequest, WaapClient, WaapDomain};
use vela_core::differ::attribute_changed;
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::waap::waap_domain_schema;

use super::{api_error, opt_bool, opt_str, required_str, validate};

fn parse_identifier(id: &ResourceId, identifier: &str) -> ProviderResult<i64> {
    identifier.parse::<i64>().map_err(|_| {
        ProviderError::new(format!("Invalid WAAP domain id '{}'", identifier))
            .for_resource(id.clone())
    })
}

pub fn flatten(domain: &WaapDomain) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(domain.name.clone()));
    attrs.insert("status".to_string(), Value::string(domain.status.clone()));
    attrs.insert(
        "api_discovery_enabled".to_string(),
        Value::Bool(domain.api_discovery_enabled),
    );
    attrs
}

pub async fn create(waap: &WaapClient, resource: &Resource) -> ProviderResult<State> {
    validate(&waap_domain_schema(), resource)?;
    let req = CreateWaapDomainRequest {
        name: required_str(&resource.attributes, "name")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        status: opt_str(&resource.attributes, "status").unwrap_or_else(|| "monitor".to_string()),
    };

    let domain = waap
        .create_domain(&req)
        .await
        .map_err(|e| api_error("create_waap_domain", &resource.id, e))?;

    // API discovery is a settings call, separate from domain creation
    if opt_bool(&resource.attributes, "api_discovery_enabled").unwrap_or(false) {
        waap.update_domain(
            domain.id,
            &UpdateWaapDomainRequest {
                status: None,
                api_discovery_enabled: Some(true),
            },
        )
        .await
        .map_err(|e| api_error("update_waap_domain", &resource.id, e))?;
    }

    read(waap, &resource.id, &domain.id.to_string()).await
}

pub async fn read(waap: &WaapClient, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
    let domain_id = parse_identifier(id, identifier)?;
    match waap.get_domain(domain_id).await {
        Ok(domain) => Ok(State::existing(id.clone(), flatten(&domain)).with_identifier(identifier)),
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_waap_domain", id, e)),
    }
}

pub async fn update(
    waap: &WaapClient,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    if attribute_changed("name", &to.attributes, &from.attributes) {
        return Err(
            ProviderError::new("The protected domain name cannot be changed, delete and recreate")
                .for_resource(id.clone()),
        );
    }

    let domain_id = parse_identifier(id, identifier)?;
    let req = UpdateWaapDomainRequest {
        status: attribute_changed("status", &to.attributes, &from.attributes)
            .then(|| opt_str(&to.attributes, "status"))
            .flatten(),
        api_discovery_enabled: attribute_changed(
            "api_discovery_enabled",
            &to.attributes,
            &from.attributes,
        )
        .then(|| opt_bool(&to.attributes, "api_discovery_enabled"))
        .flatten(),
    };
    if req.status.is_some() || req.api_discovery_enabled.is_some() {
        waap.update_domain(domain_id, &req)
            .await
            .map_err(|e| api_error("update_waap_domain", id, e))?;
    }

    read(waap, id, identifier).await
}

pub async fn delete(waap: &WaapClient, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
    let domain_id = parse_identifier(id, identifier)?;
    match waap.delete_domain(domain_id).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("delete_waap_domain", id, e)),
    }
}
