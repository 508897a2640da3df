//! Resource handlers: the create/read/update/delete quartet per resource
//! type, plus the expand/flatten mappers they are built from.

use std::collections::HashMap;

use cirrus_sdk::ApiError;
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, Value};
use vela_core::schema::ResourceSchema;

pub mod cdn_resource;
pub mod datasources;
pub mod dns;
pub mod edge_app;
pub mod instance;
pub mod k8s_cluster;
pub mod loadbalancer;
pub mod security_group;
pub mod storage_bucket;
pub mod volume;
pub mod waap_domain;

/// Validate attributes against the schema, collecting every violation into
/// one diagnostic. Runs before any backend call.
pub(crate) fn validate(schema: &ResourceSchema, resource: &Resource) -> ProviderResult<()> {
    schema.validate(&resource.attributes).map_err(|errors| {
        let detail = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        ProviderError::new(format!("Validation failed: {}", detail))
            .for_resource(resource.id.clone())
    })
}

/// Wrap an SDK error with operation context
pub(crate) fn api_error(operation: &str, id: &ResourceId, err: ApiError) -> ProviderError {
    ProviderError::new(format!("{} failed: {}", operation, err))
        .for_resource(id.clone())
        .with_cause(err)
}

// Attribute accessors shared by the expand mappers. Schema validation has
// already run, so a missing required attribute is an internal error worth
// surfacing verbatim.

pub(crate) fn required_str<'a>(
    attrs: &'a HashMap<String, Value>,
    key: &str,
) -> ProviderResult<&'a str> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ProviderError::new(format!("Missing required attribute '{}'", key)))
}

pub(crate) fn opt_str(attrs: &HashMap<String, Value>, key: &str) -> Option<String> {
    attrs.get(key).and_then(Value::as_str).map(String::from)
}

pub(crate) fn opt_int(attrs: &HashMap<String, Value>, key: &str) -> Option<i64> {
    attrs.get(key).and_then(Value::as_int)
}

pub(crate) fn opt_bool(attrs: &HashMap<String, Value>, key: &str) -> Option<bool> {
    attrs.get(key).and_then(Value::as_bool)
}

/// Collect a list-of-strings attribute; absent means empty
pub(crate) fn string_list(attrs: &HashMap<String, Value>, key: &str) -> Vec<String> {
    attrs
        .get(key)
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Collect a map-of-strings attribute; absent means empty
pub(crate) fn string_map(attrs: &HashMap<String, Value>, key: &str) -> HashMap<String, String> {
    attrs
        .get(key)
        .and_then(Value::as_map)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn value_string_list(items: &[String]) -> Value {
    Value::List(items.iter().map(|s| Value::string(s.clone())).collect())
}

pub(crate) fn value_string_map(map: &HashMap<String, String>) -> Value {
    Value::Map(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::string(v.clone())))
            .collect(),
    )
}
