//! Edge app schema

use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

pub fn edge_app_schema() -> ResourceSchema {
    ResourceSchema::new("edge_app")
        .with_description("A compiled application deployed at the edge")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(AttributeSchema::new("binary_id", types::positive_int()).required())
        .attribute(AttributeSchema::new(
            "env",
            AttributeType::Map(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(AttributeSchema::new("url", AttributeType::String).computed())
}
