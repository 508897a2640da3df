//! CDN resource schema

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// Nested option map; every option is a map carrying `enabled` plus its value
///
/// Supported options: edge_cache_settings {enabled, default},
/// gzip_on {enabled, value}, host_header {enabled, value}.
fn options_block() -> AttributeType {
    AttributeType::Custom {
        name: "CdnOptions".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: |value| {
            let map = match value {
                Value::Map(m) => m,
                _ => return Err("Expected map".to_string()),
            };
            for (key, option) in map {
                let option = match option {
                    Value::Map(m) => m,
                    _ => return Err(format!("Option '{}' must be a map", key)),
                };
                if option.get("enabled").and_then(Value::as_bool).is_none() {
                    return Err(format!("Option '{}' requires a boolean 'enabled'", key));
                }
                match key.as_str() {
                    "edge_cache_settings" => {
                        if option.get("default").and_then(Value::as_str).is_none() {
                            return Err(
                                "edge_cache_settings requires a 'default' lifetime".to_string()
                            );
                        }
                    }
                    "gzip_on" => {
                        if option.get("value").and_then(Value::as_bool).is_none() {
                            return Err("gzip_on requires a boolean 'value'".to_string());
                        }
                    }
                    "host_header" => {
                        if option.get("value").and_then(Value::as_str).is_none() {
                            return Err("host_header requires a string 'value'".to_string());
                        }
                    }
                    other => return Err(format!("Unknown CDN option '{}'", other)),
                }
            }
            Ok(())
        },
    }
}

pub fn cdn_resource_schema() -> ResourceSchema {
    ResourceSchema::new("cdn_resource")
        .with_description("A CDN resource serving content for a delivery hostname")
        .attribute(AttributeSchema::new("cname", AttributeType::String).required())
        .attribute(AttributeSchema::new("origin", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "secondary_hostnames",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new("options", options_block()))
        .attribute(AttributeSchema::new("active", AttributeType::Bool).with_default(Value::Bool(true)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn unknown_option_is_rejected() {
        let mut inner = HashMap::new();
        inner.insert("enabled".to_string(), Value::Bool(true));
        inner.insert("value".to_string(), Value::Bool(true));
        let mut options = HashMap::new();
        options.insert("http3".to_string(), Value::Map(inner));
        assert!(options_block().validate(&Value::Map(options)).is_err());
    }

    #[test]
    fn known_options_validate_their_value_shape() {
        let mut cache = HashMap::new();
        cache.insert("enabled".to_string(), Value::Bool(true));
        cache.insert("default".to_string(), Value::string("10m"));
        let mut options = HashMap::new();
        options.insert("edge_cache_settings".to_string(), Value::Map(cache));
        assert!(options_block().validate(&Value::Map(options.clone())).is_ok());

        let mut gzip = HashMap::new();
        gzip.insert("enabled".to_string(), Value::Bool(true));
        options.insert("gzip_on".to_string(), Value::Map(gzip));
        assert!(options_block().validate(&Value::Map(options)).is_err());
    }
}
