//! DNS resource handlers (zone and record set)
//!
//! Record sets have a composite identifier "zone/name/type" since the
//! product API addresses them by that triple rather than a generated id.

use std::collections::HashMap;

use cirrus_sdk::dns::{DnsClient, ResourceRecord, Rrset, Zone};
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::dns::{dns_rrset_schema, dns_zone_schema};

use super::{api_error, opt_int, required_str, validate};

// --- zone ---

pub fn flatten_zone(zone: &Zone) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(zone.name.clone()));
    if let Some(serial) = zone.serial {
        attrs.insert("serial".to_string(), Value::Int(serial as i64));
    }
    if let Some(ref status) = zone.status {
        attrs.insert("status".to_string(), Value::string(status.clone()));
    }
    attrs
}

pub async fn create_zone(dns: &DnsClient, resource: &Resource) -> ProviderResult<State> {
    validate(&dns_zone_schema(), resource)?;
    let name = required_str(&resource.attributes, "name")
        .map_err(|e| e.for_resource(resource.id.clone()))?;

    let zone = dns
        .create_zone(name)
        .await
        .map_err(|e| api_error("create_zone", &resource.id, e))?;

    read_zone(dns, &resource.id, &zone.name).await
}

pub async fn read_zone(dns: &DnsClient, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
    match dns.get_zone(identifier).await {
        Ok(zone) => Ok(State::existing(id.clone(), flatten_zone(&zone)).with_identifier(zone.name)),
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_zone", id, e)),
    }
}

pub async fn delete_zone(dns: &DnsClient, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
    match dns.delete_zone(identifier).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("delete_zone", id, e)),
    }
}

// --- record set ---

/// "zone/name/type" composite identifier
pub fn rrset_identifier(zone: &str, name: &str, rrset_type: &str) -> String {
    format!("{}/{}/{}", zone, name, rrset_type)
}

fn split_identifier(id: &ResourceId, identifier: &str) -> ProviderResult<(String, String, String)> {
    let parts: Vec<&str> = identifier.split('/').collect();
    match parts.as_slice() {
        [zone, name, rrset_type] => {
            Ok((zone.to_string(), name.to_string(), rrset_type.to_string()))
        }
        _ => Err(ProviderError::new(format!(
            "Invalid record set identifier '{}', expected zone/name/type",
            identifier
        ))
        .for_resource(id.clone())),
    }
}

pub fn expand_rrset(attrs: &HashMap<String, Value>) -> ProviderResult<Rrset> {
    let records = attrs
        .get("records")
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|content| ResourceRecord {
                    content: content.to_string(),
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    if records.is_empty() {
        return Err(ProviderError::new("At least one record is required"));
    }
    Ok(Rrset {
        ttl: opt_int(attrs, "ttl").unwrap_or(3600),
        records,
    })
}

pub fn flatten_rrset(zone: &str, name: &str, rrset_type: &str, rrset: &Rrset) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("zone".to_string(), Value::string(zone));
    attrs.insert("name".to_string(), Value::string(name));
    attrs.insert("type".to_string(), Value::string(rrset_type));
    attrs.insert("ttl".to_string(), Value::Int(rrset.ttl));
    attrs.insert(
        "records".to_string(),
        Value::List(
            rrset
                .records
                .iter()
                .map(|r| Value::string(r.content.clone()))
                .collect(),
        ),
    );
    attrs
}

pub async fn create_rrset(dns: &DnsClient, resource: &Resource) -> ProviderResult<State> {
    validate(&dns_rrset_schema(), resource)?;
    let zone = required_str(&resource.attributes, "zone")
        .map_err(|e| e.for_resource(resource.id.clone()))?;
    let name = required_str(&resource.attributes, "name")
        .map_err(|e| e.for_resource(resource.id.clone()))?;
    let rrset_type = required_str(&resource.attributes, "type")
        .map_err(|e| e.for_resource(resource.id.clone()))?;
    let rrset =
        expand_rrset(&resource.attributes).map_err(|e| e.for_resource(resource.id.clone()))?;

    dns.put_rrset(zone, name, rrset_type, &rrset)
        .await
        .map_err(|e| api_error("put_rrset", &resource.id, e))?;

    read_rrset(dns, &resource.id, &rrset_identifier(zone, name, rrset_type)).await
}

pub async fn read_rrset(
    dns: &DnsClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    let (zone, name, rrset_type) = split_identifier(id, identifier)?;
    match dns.get_rrset(&zone, &name, &rrset_type).await {
        Ok(rrset) => Ok(State::existing(
            id.clone(),
            flatten_rrset(&zone, &name, &rrset_type, &rrset),
        )
        .with_identifier(identifier)),
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_rrset", id, e)),
    }
}

/// The record set is replaced wholesale; ttl and records are one change group
pub async fn update_rrset(
    dns: &DnsClient,
    id: &ResourceId,
    identifier: &str,
    to: &Resource,
) -> ProviderResult<State> {
    let (zone, name, rrset_type) = split_identifier(id, identifier)?;
    let rrset = expand_rrset(&to.attributes).map_err(|e| e.for_resource(id.clone()))?;

    dns.put_rrset(&zone, &name, &rrset_type, &rrset)
        .await
        .map_err(|e| api_error("put_rrset", id, e))?;

    read_rrset(dns, id, identifier).await
}

pub async fn delete_rrset(
    dns: &DnsClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    let (zone, name, rrset_type) = split_identifier(id, identifier)?;
    match dns.delete_rrset(&zone, &name, &rrset_type).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("delete_rrset", id, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rrset_round_trip() {
        let mut attrs = HashMap::new();
        attrs.insert("zone".to_string(), Value::string("example.com"));
        attrs.insert("name".to_string(), Value::string("www"));
        attrs.insert("type".to_string(), Value::string("A"));
        attrs.insert("ttl".to_string(), Value::Int(600));
        attrs.insert(
            "records".to_string(),
            Value::List(vec![
                Value::string("203.0.113.7"),
                Value::string("203.0.113.8"),
            ]),
        );

        let rrset = expand_rrset(&attrs).unwrap();
        let flattened = flatten_rrset("example.com", "www", "A", &rrset);
        assert_eq!(flattened, attrs);
    }

    #[test]
    fn empty_records_are_rejected() {
        let mut attrs = HashMap::new();
        attrs.insert("records".to_string(), Value::List(vec![]));
        assert!(expand_rrset(&attrs).is_err());
    }

    #[test]
    fn identifier_splits_into_triple() {
        let id = ResourceId::new("dns_rrset", "www");
        let identifier = rrset_identifier("example.com", "www", "A");
        let (zone, name, rrset_type) = split_identifier(&id, &identifier).unwrap();
        assert_eq!((zone.as_str(), name.as_str(), rrset_type.as_str()),
            ("example.com", "www", "A"));

        assert!(split_identifier(&id, "missing-parts").is_err());
    }
}
