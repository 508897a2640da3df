//! DNS schemas (zone and record set)

use std::sync::LazyLock;

use regex::Regex;
use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

const VALID_RRSET_TYPES: &[&str] = &["A", "AAAA", "CNAME", "MX", "NS", "SRV", "TXT"];

static ZONE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}$").expect("static pattern")
});

fn zone_name() -> AttributeType {
    AttributeType::Custom {
        name: "ZoneName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                if ZONE_NAME_RE.is_match(s) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not a valid zone name", s))
                }
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

pub fn dns_zone_schema() -> ResourceSchema {
    ResourceSchema::new("dns_zone")
        .with_description("An authoritative DNS zone")
        .attribute(AttributeSchema::new("name", zone_name()).required())
        .attribute(AttributeSchema::new("serial", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
}

pub fn dns_rrset_schema() -> ResourceSchema {
    ResourceSchema::new("dns_rrset")
        .with_description("A record set inside a DNS zone")
        .attribute(AttributeSchema::new("zone", zone_name()).required())
        .attribute(AttributeSchema::new("name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new(
                "type",
                AttributeType::Enum(VALID_RRSET_TYPES.iter().map(|s| s.to_string()).collect()),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("ttl", types::positive_int()).with_default(Value::Int(3600)))
        .attribute(
            AttributeSchema::new(
                "records",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .required(),
        )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn zone_names_are_validated() {
        let t = zone_name();
        assert!(t.validate(&Value::string("example.com")).is_ok());
        assert!(t.validate(&Value::string("sub.example.co.uk")).is_ok());
        assert!(t.validate(&Value::string("no_underscores.com")).is_err());
        assert!(t.validate(&Value::string("single-label")).is_err());
    }

    #[test]
    fn rrset_type_is_an_enum() {
        let mut attrs = HashMap::new();
        attrs.insert("zone".to_string(), Value::string("example.com"));
        attrs.insert("name".to_string(), Value::string("www"));
        attrs.insert("type".to_string(), Value::string("ALIAS"));
        attrs.insert(
            "records".to_string(),
            Value::List(vec![Value::string("203.0.113.7")]),
        );
        assert!(dns_rrset_schema().validate(&attrs).is_err());

        attrs.insert("type".to_string(), Value::string("A"));
        assert!(dns_rrset_schema().validate(&attrs).is_ok());
    }
}
