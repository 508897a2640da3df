//! Object storage bucket schema

use std::sync::LazyLock;

use regex::Regex;
use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

static BUCKET_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,61}[a-z0-9]$").expect("static pattern"));

fn bucket_name() -> AttributeType {
    AttributeType::Custom {
        name: "BucketName".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            if let Value::String(s) = value {
                if BUCKET_NAME_RE.is_match(s) {
                    Ok(())
                } else {
                    Err(format!(
                        "'{}' is not a valid bucket name (3-63 lowercase alphanumerics and hyphens)",
                        s
                    ))
                }
            } else {
                Err("Expected string".to_string())
            }
        },
    }
}

pub fn storage_bucket_schema() -> ResourceSchema {
    ResourceSchema::new("storage_bucket")
        .with_description("An object storage bucket")
        .attribute(AttributeSchema::new("name", bucket_name()).required())
        .attribute(AttributeSchema::new("location", AttributeType::String).required())
        .attribute(
            AttributeSchema::new("versioning", AttributeType::Bool).with_default(Value::Bool(false)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_names_are_validated() {
        let t = bucket_name();
        assert!(t.validate(&Value::string("my-bucket")).is_ok());
        assert!(t.validate(&Value::string("ab")).is_err()); // too short
        assert!(t.validate(&Value::string("My-Bucket")).is_err()); // uppercase
        assert!(t.validate(&Value::string("-bucket")).is_err()); // leading hyphen
    }
}
