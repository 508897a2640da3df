//! CDN resource handlers
//!
//! All calls go through a mutex-guarded client: the CDN backend rejects
//! concurrent modifications of one account, so resource operations running
//! in parallel must take turns.

use std::collections::HashMap;

use cirrus_sdk::cdn::{
    CdnClient, CdnOptions, CdnResource, CreateCdnResourceRequest, EdgeCacheSettings, HostHeader,
    ToggleOption, UpdateCdnResourceRequest,
};
use tokio::sync::Mutex;
use vela_core::differ::attribute_changed;
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::cdn::cdn_resource_schema;

use super::{api_error, opt_bool, required_str, string_list, validate, value_string_list};

fn parse_identifier(id: &ResourceId, identifier: &str) -> ProviderResult<i64> {
    identifier.parse::<i64>().map_err(|_| {
        ProviderError::new(format!("Invalid CDN resource id '{}'", identifier))
            .for_resource(id.clone())
    })
}

pub fn expand_options(attrs: &HashMap<String, Value>) -> ProviderResult<Option<CdnOptions>> {
    let Some(map) = attrs.get("options").and_then(Value::as_map) else {
        return Ok(None);
    };

    let mut options = CdnOptions::default();
    for (key, option) in map {
        let option = option
            .as_map()
            .ok_or_else(|| ProviderError::new(format!("Option '{}' must be a map", key)))?;
        let enabled = option
            .get("enabled")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                ProviderError::new(format!("Option '{}' requires a boolean 'enabled'", key))
            })?;
        match key.as_str() {
            "edge_cache_settings" => {
                options.edge_cache_settings = Some(EdgeCacheSettings {
                    enabled,
                    default: option
                        .get("default")
                        .and_then(Value::as_str)
                        .ok_or_else(|| {
                            ProviderError::new("edge_cache_settings requires a 'default' lifetime")
                        })?
                        .to_string(),
                });
            }
            "gzip_on" => {
                options.gzip_on = Some(ToggleOption {
                    enabled,
                    value: option.get("value").and_then(Value::as_bool).ok_or_else(|| {
                        ProviderError::new("gzip_on requires a boolean 'value'")
                    })?,
                });
            }
            "host_header" => {
                options.host_header = Some(HostHeader {
                    enabled,
                    value: option
                        .get("value")
                        .and_then(Value::as_str)
                        .ok_or_else(|| ProviderError::new("host_header requires a string 'value'"))?
                        .to_string(),
                });
            }
            other => {
                return Err(ProviderError::new(format!("Unknown CDN option '{}'", other)));
            }
        }
    }
    Ok(Some(options))
}

pub fn flatten_options(options: &CdnOptions) -> Option<Value> {
    let mut map = HashMap::new();
    if let Some(ref cache) = options.edge_cache_settings {
        let mut inner = HashMap::new();
        inner.insert("enabled".to_string(), Value::Bool(cache.enabled));
        inner.insert("default".to_string(), Value::string(cache.default.clone()));
        map.insert("edge_cache_settings".to_string(), Value::Map(inner));
    }
    if let Some(ref gzip) = options.gzip_on {
        let mut inner = HashMap::new();
        inner.insert("enabled".to_string(), Value::Bool(gzip.enabled));
        inner.insert("value".to_string(), Value::Bool(gzip.value));
        map.insert("gzip_on".to_string(), Value::Map(inner));
    }
    if let Some(ref host) = options.host_header {
        let mut inner = HashMap::new();
        inner.insert("enabled".to_string(), Value::Bool(host.enabled));
        inner.insert("value".to_string(), Value::string(host.value.clone()));
        map.insert("host_header".to_string(), Value::Map(inner));
    }
    if map.is_empty() { None } else { Some(Value::Map(map)) }
}

pub fn flatten(resource: &CdnResource) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("cname".to_string(), Value::string(resource.cname.clone()));
    attrs.insert("origin".to_string(), Value::string(resource.origin.clone()));
    attrs.insert("active".to_string(), Value::Bool(resource.active));
    if !resource.secondary_hostnames.is_empty() {
        attrs.insert(
            "secondary_hostnames".to_string(),
            value_string_list(&resource.secondary_hostnames),
        );
    }
    if let Some(options) = flatten_options(&resource.options) {
        attrs.insert("options".to_string(), options);
    }
    attrs
}

pub async fn create(cdn: &Mutex<CdnClient>, resource: &Resource) -> ProviderResult<State> {
    validate(&cdn_resource_schema(), resource)?;
    let req = CreateCdnResourceRequest {
        cname: required_str(&resource.attributes, "cname")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        origin: required_str(&resource.attributes, "origin")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        secondary_hostnames: string_list(&resource.attributes, "secondary_hostnames"),
        options: expand_options(&resource.attributes)
            .map_err(|e| e.for_resource(resource.id.clone()))?,
    };

    let created = {
        let client = cdn.lock().await;
        client
            .create_resource(&req)
            .await
            .map_err(|e| api_error("create_cdn_resource", &resource.id, e))?
    };

    read(cdn, &resource.id, &created.id.to_string()).await
}

pub async fn read(
    cdn: &Mutex<CdnClient>,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let resource_id = parse_identifier(id, identifier)?;
    let result = {
        let client = cdn.lock().await;
        client.get_resource(resource_id).await
    };
    match result {
        Ok(resource) => {
            Ok(State::existing(id.clone(), flatten(&resource)).with_identifier(identifier))
        }
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_cdn_resource", id, e)),
    }
}

pub async fn update(
    cdn: &Mutex<CdnClient>,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    if attribute_changed("cname", &to.attributes, &from.attributes) {
        return Err(
            ProviderError::new("The delivery cname cannot be changed, delete and recreate")
                .for_resource(id.clone()),
        );
    }

    let resource_id = parse_identifier(id, identifier)?;
    let req = UpdateCdnResourceRequest {
        origin: attribute_changed("origin", &to.attributes, &from.attributes)
            .then(|| required_str(&to.attributes, "origin").map(String::from))
            .transpose()
            .map_err(|e| e.for_resource(id.clone()))?,
        active: attribute_changed("active", &to.attributes, &from.attributes)
            .then(|| opt_bool(&to.attributes, "active"))
            .flatten(),
        secondary_hostnames: attribute_changed(
            "secondary_hostnames",
            &to.attributes,
            &from.attributes,
        )
        .then(|| string_list(&to.attributes, "secondary_hostnames")),
        options: attribute_changed("options", &to.attributes, &from.attributes)
            .then(|| expand_options(&to.attributes))
            .transpose()
            .map_err(|e| e.for_resource(id.clone()))?
            .flatten(),
    };

    {
        let client = cdn.lock().await;
        client
            .update_resource(resource_id, &req)
            .await
            .map_err(|e| api_error("update_cdn_resource", id, e))?;
    }

    read(cdn, id, identifier).await
}

pub async fn delete(
    cdn: &Mutex<CdnClient>,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let resource_id = parse_identifier(id, identifier)?;
    let result = {
        let client = cdn.lock().await;
        client.delete_resource(resource_id).await
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("delete_cdn_resource", id, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_value() -> Value {
        let mut cache = HashMap::new();
        cache.insert("enabled".to_string(), Value::Bool(true));
        cache.insert("default".to_string(), Value::string("10m"));
        let mut gzip = HashMap::new();
        gzip.insert("enabled".to_string(), Value::Bool(true));
        gzip.insert("value".to_string(), Value::Bool(true));
        let mut options = HashMap::new();
        options.insert("edge_cache_settings".to_string(), Value::Map(cache));
        options.insert("gzip_on".to_string(), Value::Map(gzip));
        Value::Map(options)
    }

    #[test]
    fn options_round_trip() {
        let mut attrs = HashMap::new();
        attrs.insert("options".to_string(), options_value());

        let expanded = expand_options(&attrs).unwrap().unwrap();
        assert_eq!(
            expanded.edge_cache_settings.as_ref().map(|c| c.default.as_str()),
            Some("10m")
        );

        let flattened = flatten_options(&expanded).unwrap();
        assert_eq!(flattened, options_value());
    }

    #[test]
    fn absent_options_expand_to_none() {
        let attrs = HashMap::new();
        assert!(expand_options(&attrs).unwrap().is_none());
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut inner = HashMap::new();
        inner.insert("enabled".to_string(), Value::Bool(true));
        let mut options = HashMap::new();
        options.insert("http3".to_string(), Value::Map(inner));
        let mut attrs = HashMap::new();
        attrs.insert("options".to_string(), Value::Map(options));
        assert!(expand_options(&attrs).is_err());
    }
}
