//! Object storage bucket resource handlers

use std::collections::HashMap;

use cirrus_sdk::storage::{Bucket, CreateBucketRequest, StorageClient};
use vela_core::differ::attribute_changed;
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::storage::storage_bucket_schema;

use super::{api_error, opt_bool, required_str, validate};

pub fn flatten(bucket: &Bucket) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(bucket.name.clone()));
    attrs.insert("location".to_string(), Value::string(bucket.location.clone()));
    attrs.insert(
        "versioning".to_string(),
        Value::Bool(bucket.versioning_enabled),
    );
    attrs
}

pub async fn create(storage: &StorageClient, resource: &Resource) -> ProviderResult<State> {
    validate(&storage_bucket_schema(), resource)?;
    let req = CreateBucketRequest {
        name: required_str(&resource.attributes, "name")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        location: required_str(&resource.attributes, "location")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
    };

    let bucket = storage
        .create_bucket(&req)
        .await
        .map_err(|e| api_error("create_bucket", &resource.id, e))?;

    // Versioning is a follow-up call; buckets are created unversioned
    if opt_bool(&resource.attributes, "versioning").unwrap_or(false) {
        storage
            .set_versioning(&bucket.name, true)
            .await
            .map_err(|e| api_error("set_versioning", &resource.id, e))?;
    }

    read(storage, &resource.id, &bucket.name).await
}

pub async fn read(
    storage: &StorageClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    match storage.get_bucket(identifier).await {
        Ok(bucket) => Ok(State::existing(id.clone(), flatten(&bucket)).with_identifier(bucket.name)),
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_bucket", id, e)),
    }
}

/// Only the versioning flag moves in place; name and location are identity
pub async fn update(
    storage: &StorageClient,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    if attribute_changed("name", &to.attributes, &from.attributes)
        || attribute_changed("location", &to.attributes, &from.attributes)
    {
        return Err(ProviderError::new(
            "Bucket name and location cannot be changed, delete and recreate",
        )
        .for_resource(id.clone()));
    }

    if attribute_changed("versioning", &to.attributes, &from.attributes) {
        let enabled = opt_bool(&to.attributes, "versioning").unwrap_or(false);
        storage
            .set_versioning(identifier, enabled)
            .await
            .map_err(|e| api_error("set_versioning", id, e))?;
    }

    read(storage, id, identifier).await
}

pub async fn delete(
    storage: &StorageClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    match storage.delete_bucket(identifier).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("delete_bucket", id, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_reports_versioning() {
        let bucket = Bucket {
            name: "assets".to_string(),
            location: "lux-1".to_string(),
            versioning_enabled: true,
        };
        let attrs = flatten(&bucket);
        assert_eq!(attrs.get("versioning"), Some(&Value::Bool(true)));
        assert_eq!(attrs.get("location"), Some(&Value::string("lux-1")));
    }
}
