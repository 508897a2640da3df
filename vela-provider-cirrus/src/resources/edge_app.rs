//! Edge app resource handlers

use std::collections::HashMap;

use cirrus_sdk::edge::{CreateEdgeAppRequest, EdgeApp, EdgeClient, UpdateEdgeAppRequest};
use vela_core::differ::attribute_changed;
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::edge::edge_app_schema;

use super::{api_error, opt_int, required_str, string_map, validate, value_string_map};

fn parse_identifier(id: &ResourceId, identifier: &str) -> ProviderResult<i64> {
    identifier.parse::<i64>().map_err(|_| {
        ProviderError::new(format!("Invalid edge app id '{}'", identifier)).for_resource(id.clone())
    })
}

pub fn flatten(app: &EdgeApp) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(app.name.clone()));
    attrs.insert("binary_id".to_string(), Value::Int(app.binary_id));
    attrs.insert("status".to_string(), Value::string(app.status.clone()));
    if !app.env.is_empty() {
        attrs.insert("env".to_string(), value_string_map(&app.env));
    }
    if let Some(ref url) = app.url {
        attrs.insert("url".to_string(), Value::string(url.clone()));
    }
    attrs
}

pub async fn create(edge: &EdgeClient, resource: &Resource) -> ProviderResult<State> {
    validate(&edge_app_schema(), resource)?;
    let req = CreateEdgeAppRequest {
        name: required_str(&resource.attributes, "name")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        binary_id: opt_int(&resource.attributes, "binary_id").ok_or_else(|| {
            ProviderError::new("Missing required attribute 'binary_id'")
                .for_resource(resource.id.clone())
        })?,
        env: string_map(&resource.attributes, "env"),
    };

    let app = edge
        .create_app(&req)
        .await
        .map_err(|e| api_error("create_edge_app", &resource.id, e))?;

    read(edge, &resource.id, &app.id.to_string()).await
}

pub async fn read(edge: &EdgeClient, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
    let app_id = parse_identifier(id, identifier)?;
    match edge.get_app(app_id).await {
        Ok(app) => Ok(State::existing(id.clone(), flatten(&app)).with_identifier(identifier)),
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_edge_app", id, e)),
    }
}

pub async fn update(
    edge: &EdgeClient,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    let app_id = parse_identifier(id, identifier)?;

    let req = UpdateEdgeAppRequest {
        binary_id: attribute_changed("binary_id", &to.attributes, &from.attributes)
            .then(|| opt_int(&to.attributes, "binary_id"))
            .flatten(),
        env: attribute_changed("env", &to.attributes, &from.attributes)
            .then(|| string_map(&to.attributes, "env")),
        status: None,
    };
    if req.binary_id.is_some() || req.env.is_some() {
        edge.update_app(app_id, &req)
            .await
            .map_err(|e| api_error("update_edge_app", id, e))?;
    }

    read(edge, id, identifier).await
}

pub async fn delete(edge: &EdgeClient, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
    let app_id = parse_identifier(id, identifier)?;
    match edge.delete_app(app_id).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("delete_edge_app", id, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_includes_computed_url() {
        let mut env = HashMap::new();
        env.insert("LOG_LEVEL".to_string(), "info".to_string());
        let app = EdgeApp {
            id: 9,
            name: "resizer".to_string(),
            status: "enabled".to_string(),
            binary_id: 4,
            env,
            url: Some("https://resizer.edge.cirrus.dev".to_string()),
        };
        let attrs = flatten(&app);
        assert_eq!(attrs.get("binary_id"), Some(&Value::Int(4)));
        assert!(attrs.contains_key("url"));
    }
}
