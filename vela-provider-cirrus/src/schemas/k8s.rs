//! Kubernetes cluster schema

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// One node pool: name, flavor_id, min_node_count, max_node_count
pub fn pool_block() -> AttributeType {
    AttributeType::Custom {
        name: "NodePool".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: |value| {
            let map = match value {
                Value::Map(m) => m,
                _ => return Err("Expected map".to_string()),
            };
            if map.get("name").and_then(Value::as_str).is_none() {
                return Err("Pool requires a name".to_string());
            }
            if map.get("flavor_id").and_then(Value::as_str).is_none() {
                return Err("Pool requires a flavor_id".to_string());
            }
            let min = map.get("min_node_count").and_then(Value::as_int);
            let max = map.get("max_node_count").and_then(Value::as_int);
            match (min, max) {
                (Some(min), Some(max)) if min >= 1 && max >= min => Ok(()),
                (Some(min), Some(max)) => Err(format!(
                    "Invalid node count bounds {}..{}: min must be >= 1 and <= max",
                    min, max
                )),
                _ => Err("Pool requires min_node_count and max_node_count".to_string()),
            }
        },
    }
}

pub fn k8s_cluster_schema() -> ResourceSchema {
    ResourceSchema::new("k8s_cluster")
        .with_description("A managed Kubernetes cluster with its node pools")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("version", AttributeType::String).required())
        .attribute(AttributeSchema::new("fixed_network", AttributeType::String).required())
        .attribute(AttributeSchema::new("fixed_subnet", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("pools", AttributeType::List(Box::new(pool_block()))).required(),
        )
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn pool_bounds_are_checked() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::string("workers"));
        map.insert("flavor_id".to_string(), Value::string("g1-standard-4"));
        map.insert("min_node_count".to_string(), Value::Int(2));
        map.insert("max_node_count".to_string(), Value::Int(1));
        assert!(pool_block().validate(&Value::Map(map.clone())).is_err());

        map.insert("max_node_count".to_string(), Value::Int(5));
        assert!(pool_block().validate(&Value::Map(map.clone())).is_ok());

        map.insert("min_node_count".to_string(), Value::Int(0));
        assert!(pool_block().validate(&Value::Map(map)).is_err());
    }
}
