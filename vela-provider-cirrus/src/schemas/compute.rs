//! Compute resource schemas (instance, volume) and lookup data sources

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

/// Network attachment block for an instance
///
/// `type` is "external" or "subnet"; subnet attachments name their subnet.
fn interface_block() -> AttributeType {
    AttributeType::Custom {
        name: "Interface".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: |value| {
            let map = match value {
                Value::Map(m) => m,
                _ => return Err("Expected map".to_string()),
            };
            match map.get("type").and_then(Value::as_str) {
                Some("external") => Ok(()),
                Some("subnet") => {
                    if map.get("subnet_id").and_then(Value::as_str).is_none() {
                        return Err("subnet interfaces require subnet_id".to_string());
                    }
                    Ok(())
                }
                Some(other) => Err(format!(
                    "Invalid interface type '{}', expected external or subnet",
                    other
                )),
                None => Err("Interface requires a type".to_string()),
            }
        },
    }
}

pub fn instance_schema() -> ResourceSchema {
    ResourceSchema::new("instance")
        .with_description("A virtual machine instance")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("flavor_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("image_id", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("boot_volume_size", types::positive_int())
                .with_default(Value::Int(20)),
        )
        .attribute(AttributeSchema::new("boot_volume_type", AttributeType::String))
        .attribute(AttributeSchema::new(
            "interfaces",
            AttributeType::List(Box::new(interface_block())),
        ))
        .attribute(AttributeSchema::new("keypair_name", AttributeType::String))
        .attribute(AttributeSchema::new(
            "metadata",
            AttributeType::Map(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new(
            "security_groups",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new(
                "addresses",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .computed(),
        )
}

pub fn volume_schema() -> ResourceSchema {
    ResourceSchema::new("volume")
        .with_description("A block storage volume")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("size", types::positive_int()).required())
        .attribute(AttributeSchema::new("type_name", AttributeType::String))
        .attribute(AttributeSchema::new("image_id", AttributeType::String))
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(AttributeSchema::new("instance_id", AttributeType::String).computed())
}

/// Data source: look up an image by name
pub fn image_schema() -> ResourceSchema {
    ResourceSchema::new("image")
        .with_description("Lookup of a bootable image by name")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("os_distro", AttributeType::String).computed())
        .attribute(AttributeSchema::new("os_version", AttributeType::String).computed())
        .attribute(AttributeSchema::new("min_disk", AttributeType::Int).computed())
}

/// Data source: look up a flavor by name
pub fn flavor_schema() -> ResourceSchema {
    ResourceSchema::new("flavor")
        .with_description("Lookup of a compute flavor by name")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("vcpus", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("ram", AttributeType::Int).computed())
}
