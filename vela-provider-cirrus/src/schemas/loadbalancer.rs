//! Load balancer schema

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

const VALID_PROTOCOLS: &[&str] = &["HTTP", "HTTPS", "TCP", "UDP"];

/// One listener: name, protocol and protocol_port
fn listener_block() -> AttributeType {
    AttributeType::Custom {
        name: "Listener".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: |value| {
            let map = match value {
                Value::Map(m) => m,
                _ => return Err("Expected map".to_string()),
            };
            if map.get("name").and_then(Value::as_str).is_none() {
                return Err("Listener requires a name".to_string());
            }
            match map.get("protocol").and_then(Value::as_str) {
                Some(p) if VALID_PROTOCOLS.contains(&p) => {}
                Some(p) => {
                    return Err(format!(
                        "Invalid protocol '{}', expected one of: {}",
                        p,
                        VALID_PROTOCOLS.join(", ")
                    ));
                }
                None => return Err("Listener requires a protocol".to_string()),
            }
            match map.get("protocol_port").and_then(Value::as_int) {
                Some(port) if (1..=65535).contains(&port) => Ok(()),
                Some(port) => Err(format!("Port {} out of range 1-65535", port)),
                None => Err("Listener requires a protocol_port".to_string()),
            }
        },
    }
}

pub fn loadbalancer_schema() -> ResourceSchema {
    ResourceSchema::new("loadbalancer")
        .with_description("A managed load balancer with its listeners")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("flavor", AttributeType::String))
        .attribute(AttributeSchema::new(
            "listeners",
            AttributeType::List(Box::new(listener_block())),
        ))
        .attribute(AttributeSchema::new("vip_address", AttributeType::String).computed())
        .attribute(AttributeSchema::new("operating_status", AttributeType::String).computed())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn listener_needs_protocol_and_port() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::string("http"));
        map.insert("protocol".to_string(), Value::string("HTTP"));
        assert!(listener_block().validate(&Value::Map(map.clone())).is_err());

        map.insert("protocol_port".to_string(), Value::Int(80));
        assert!(listener_block().validate(&Value::Map(map.clone())).is_ok());

        map.insert("protocol".to_string(), Value::string("GOPHER"));
        assert!(listener_block().validate(&Value::Map(map)).is_err());
    }
}
