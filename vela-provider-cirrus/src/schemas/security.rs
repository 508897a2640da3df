//! Security group schema

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema, validate_cidr};

const VALID_DIRECTIONS: &[&str] = &["ingress", "egress"];
const VALID_PROTOCOLS: &[&str] = &["tcp", "udp", "icmp", "any"];

/// One firewall rule
///
/// Keys: direction (required), protocol, port_range_min, port_range_max,
/// remote_ip_prefix, description.
pub fn rule_block() -> AttributeType {
    AttributeType::Custom {
        name: "SecurityGroupRule".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: |value| {
            let map = match value {
                Value::Map(m) => m,
                _ => return Err("Expected map".to_string()),
            };

            match map.get("direction").and_then(Value::as_str) {
                Some(d) if VALID_DIRECTIONS.contains(&d) => {}
                Some(d) => {
                    return Err(format!(
                        "Invalid direction '{}', expected one of: {}",
                        d,
                        VALID_DIRECTIONS.join(", ")
                    ));
                }
                None => return Err("Rule requires a direction".to_string()),
            }

            if let Some(p) = map.get("protocol").and_then(Value::as_str)
                && !VALID_PROTOCOLS.contains(&p)
            {
                return Err(format!(
                    "Invalid protocol '{}', expected one of: {}",
                    p,
                    VALID_PROTOCOLS.join(", ")
                ));
            }

            let min = map.get("port_range_min").and_then(Value::as_int);
            let max = map.get("port_range_max").and_then(Value::as_int);
            for port in [min, max].into_iter().flatten() {
                if !(0..=65535).contains(&port) {
                    return Err(format!("Port {} out of range 0-65535", port));
                }
            }
            if let (Some(min), Some(max)) = (min, max)
                && min > max
            {
                return Err(format!(
                    "port_range_min {} is greater than port_range_max {}",
                    min, max
                ));
            }

            if let Some(prefix) = map.get("remote_ip_prefix").and_then(Value::as_str) {
                validate_cidr(prefix)?;
            }

            Ok(())
        },
    }
}

pub fn security_group_schema() -> ResourceSchema {
    ResourceSchema::new("security_group")
        .with_description("A security group with its firewall rules")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(
            AttributeSchema::new("rules", AttributeType::List(Box::new(rule_block()))).required(),
        )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn rule(direction: &str) -> Value {
        let mut map = HashMap::new();
        map.insert("direction".to_string(), Value::string(direction));
        Value::Map(map)
    }

    #[test]
    fn direction_is_mandatory() {
        let empty = Value::Map(HashMap::new());
        assert!(rule_block().validate(&empty).is_err());
        assert!(rule_block().validate(&rule("ingress")).is_ok());
        assert!(rule_block().validate(&rule("egress")).is_ok());
        assert!(rule_block().validate(&rule("both")).is_err());
    }

    #[test]
    fn port_bounds_are_checked() {
        let mut map = HashMap::new();
        map.insert("direction".to_string(), Value::string("ingress"));
        map.insert("port_range_min".to_string(), Value::Int(8080));
        map.insert("port_range_max".to_string(), Value::Int(80));
        assert!(rule_block().validate(&Value::Map(map.clone())).is_err());

        map.insert("port_range_max".to_string(), Value::Int(8081));
        assert!(rule_block().validate(&Value::Map(map.clone())).is_ok());

        map.insert("port_range_max".to_string(), Value::Int(70000));
        assert!(rule_block().validate(&Value::Map(map)).is_err());
    }

    #[test]
    fn remote_prefix_must_be_cidr() {
        let mut map = HashMap::new();
        map.insert("direction".to_string(), Value::string("egress"));
        map.insert("remote_ip_prefix".to_string(), Value::string("not-a-cidr"));
        assert!(rule_block().validate(&Value::Map(map.clone())).is_err());

        map.insert("remote_ip_prefix".to_string(), Value::string("0.0.0.0/0"));
        assert!(rule_block().validate(&Value::Map(map)).is_ok());
    }
}
