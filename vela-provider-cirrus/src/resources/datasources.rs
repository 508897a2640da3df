//! Read-only data source lookups
//!
//! Data sources are addressed by their lookup name (the resource name in
//! the id), never by a backend identifier, and are only ever read.

use std::collections::HashMap;

use cirrus_sdk::compute::{ComputeClient, Flavor, Image};
use vela_core::provider::ProviderResult;
use vela_core::resource::{ResourceId, State, Value};

use super::api_error;

pub fn flatten_image(image: &Image) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(image.name.clone()));
    if let Some(ref distro) = image.os_distro {
        attrs.insert("os_distro".to_string(), Value::string(distro.clone()));
    }
    if let Some(ref version) = image.os_version {
        attrs.insert("os_version".to_string(), Value::string(version.clone()));
    }
    if let Some(min_disk) = image.min_disk {
        attrs.insert("min_disk".to_string(), Value::Int(min_disk));
    }
    attrs
}

pub fn flatten_flavor(flavor: &Flavor) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(flavor.flavor_name.clone()));
    attrs.insert("vcpus".to_string(), Value::Int(flavor.vcpus));
    attrs.insert("ram".to_string(), Value::Int(flavor.ram));
    attrs
}

pub async fn read_image(compute: &ComputeClient, id: &ResourceId) -> ProviderResult<State> {
    match compute.image_by_name(&id.name).await {
        Ok(image) => Ok(State::existing(id.clone(), flatten_image(&image)).with_identifier(image.id)),
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("image_by_name", id, e)),
    }
}

pub async fn read_flavor(compute: &ComputeClient, id: &ResourceId) -> ProviderResult<State> {
    match compute.flavor_by_name(&id.name).await {
        Ok(flavor) => {
            Ok(State::existing(id.clone(), flatten_flavor(&flavor)).with_identifier(flavor.flavor_id))
        }
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("flavor_by_name", id, e)),
    }
}
