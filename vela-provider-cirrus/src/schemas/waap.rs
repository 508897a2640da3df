//! WAAP domain schema

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

pub fn waap_domain_schema() -> ResourceSchema {
    ResourceSchema::new("waap_domain")
        .with_description("A domain protected by the web application and API protection product")
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new(
                "status",
                AttributeType::Enum(vec![
                    "active".to_string(),
                    "monitor".to_string(),
                    "bypass".to_string(),
                ]),
            )
            .with_default(Value::string("monitor")),
        )
        .attribute(
            AttributeSchema::new("api_discovery_enabled", AttributeType::Bool)
                .with_default(Value::Bool(false)),
        )
}
