//! Security group resource handlers
//!
//! Rules have no stable identity of their own in the attribute map, so
//! updates diff the desired rule set against the remote one and converge by
//! adding the missing rules and deleting the extra ones.

use std::collections::HashMap;

use cirrus_sdk::security::{
    CreateSecurityGroupRequest, RuleSpec, SecurityGroup, SecurityGroupClient, SecurityGroupRule,
    UpdateSecurityGroupRequest,
};
use vela_core::differ::attribute_changed;
use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::schemas::security::security_group_schema;

use super::{api_error, opt_str, required_str, validate};

/// Fields that identify a rule across the local and remote representations
type RuleKey = (
    String,
    Option<String>,
    Option<i64>,
    Option<i64>,
    Option<String>,
);

fn spec_key(rule: &RuleSpec) -> RuleKey {
    (
        rule.direction.clone(),
        rule.protocol.clone(),
        rule.port_range_min,
        rule.port_range_max,
        rule.remote_ip_prefix.clone(),
    )
}

fn remote_key(rule: &SecurityGroupRule) -> RuleKey {
    (
        rule.direction.clone(),
        rule.protocol.clone(),
        rule.port_range_min,
        rule.port_range_max,
        rule.remote_ip_prefix.clone(),
    )
}

/// Rules to add and remote rule ids to drop to converge on the desired set
pub fn diff_rules(
    desired: &[RuleSpec],
    current: &[SecurityGroupRule],
) -> (Vec<RuleSpec>, Vec<String>) {
    let to_add = desired
        .iter()
        .filter(|spec| !current.iter().any(|r| remote_key(r) == spec_key(spec)))
        .cloned()
        .collect();
    let to_remove = current
        .iter()
        .filter(|r| !desired.iter().any(|spec| spec_key(spec) == remote_key(r)))
        .map(|r| r.id.clone())
        .collect();
    (to_add, to_remove)
}

pub fn expand_rules(attrs: &HashMap<String, Value>) -> ProviderResult<Vec<RuleSpec>> {
    let mut rules = Vec::new();
    if let Some(items) = attrs.get("rules").and_then(Value::as_list) {
        for item in items {
            let map = item
                .as_map()
                .ok_or_else(|| ProviderError::new("Rule must be a map"))?;
            rules.push(RuleSpec {
                direction: required_str(map, "direction")?.to_string(),
                protocol: opt_str(map, "protocol"),
                port_range_min: map.get("port_range_min").and_then(Value::as_int),
                port_range_max: map.get("port_range_max").and_then(Value::as_int),
                remote_ip_prefix: opt_str(map, "remote_ip_prefix"),
                description: opt_str(map, "description"),
            });
        }
    }
    Ok(rules)
}

fn flatten_rule(rule: &SecurityGroupRule) -> Value {
    let mut map = HashMap::new();
    map.insert("direction".to_string(), Value::string(rule.direction.clone()));
    if let Some(ref protocol) = rule.protocol {
        map.insert("protocol".to_string(), Value::string(protocol.clone()));
    }
    if let Some(min) = rule.port_range_min {
        map.insert("port_range_min".to_string(), Value::Int(min));
    }
    if let Some(max) = rule.port_range_max {
        map.insert("port_range_max".to_string(), Value::Int(max));
    }
    if let Some(ref prefix) = rule.remote_ip_prefix {
        map.insert("remote_ip_prefix".to_string(), Value::string(prefix.clone()));
    }
    if let Some(ref description) = rule.description {
        map.insert("description".to_string(), Value::string(description.clone()));
    }
    Value::Map(map)
}

pub fn flatten(group: &SecurityGroup) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("name".to_string(), Value::string(group.name.clone()));
    if let Some(ref description) = group.description {
        attrs.insert("description".to_string(), Value::string(description.clone()));
    }
    attrs.insert(
        "rules".to_string(),
        Value::List(group.security_group_rules.iter().map(flatten_rule).collect()),
    );
    attrs
}

/// Groups must allow some egress; a rule set without any egress rule is a
/// configuration mistake caught before the backend is called.
fn require_egress(rules: &[RuleSpec], id: &ResourceId) -> ProviderResult<()> {
    if rules.iter().any(|r| r.direction == "egress") {
        Ok(())
    } else {
        Err(
            ProviderError::new("At least one egress rule is required")
                .for_resource(id.clone()),
        )
    }
}

pub async fn create(
    security: &SecurityGroupClient,
    resource: &Resource,
) -> ProviderResult<State> {
    validate(&security_group_schema(), resource)?;
    let rules = expand_rules(&resource.attributes).map_err(|e| e.for_resource(resource.id.clone()))?;
    require_egress(&rules, &resource.id)?;

    let req = CreateSecurityGroupRequest {
        name: required_str(&resource.attributes, "name")
            .map_err(|e| e.for_resource(resource.id.clone()))?
            .to_string(),
        description: opt_str(&resource.attributes, "description"),
        security_group_rules: rules,
    };

    let group = security
        .create(&req)
        .await
        .map_err(|e| api_error("create_security_group", &resource.id, e))?;

    read(security, &resource.id, &group.id).await
}

pub async fn read(
    security: &SecurityGroupClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<State> {
    match security.get(identifier).await {
        Ok(group) => Ok(State::existing(id.clone(), flatten(&group)).with_identifier(group.id)),
        Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
        Err(e) => Err(api_error("get_security_group", id, e)),
    }
}

/// Name/description and rule membership are separate change groups. Rule
/// changes are applied one by one; a failure mid-way leaves the group
/// partially converged and the next read reports the actual rule set.
pub async fn update(
    security: &SecurityGroupClient,
    id: &ResourceId,
    identifier: &str,
    from: &State,
    to: &Resource,
) -> ProviderResult<State> {
    let name_changed = attribute_changed("name", &to.attributes, &from.attributes);
    let description_changed = attribute_changed("description", &to.attributes, &from.attributes);
    if name_changed || description_changed {
        let req = UpdateSecurityGroupRequest {
            name: name_changed.then(|| opt_str(&to.attributes, "name")).flatten(),
            description: description_changed
                .then(|| opt_str(&to.attributes, "description"))
                .flatten(),
        };
        security
            .update(identifier, &req)
            .await
            .map_err(|e| api_error("update_security_group", id, e))?;
    }

    if attribute_changed("rules", &to.attributes, &from.attributes) {
        let desired = expand_rules(&to.attributes).map_err(|e| e.for_resource(id.clone()))?;
        require_egress(&desired, id)?;

        let current = security
            .get(identifier)
            .await
            .map_err(|e| api_error("get_security_group", id, e))?;
        let (to_add, to_remove) = diff_rules(&desired, &current.security_group_rules);

        for rule in &to_add {
            security
                .add_rule(identifier, rule)
                .await
                .map_err(|e| api_error("add_security_group_rule", id, e))?;
        }
        for rule_id in &to_remove {
            security
                .delete_rule(rule_id)
                .await
                .map_err(|e| api_error("delete_security_group_rule", id, e))?;
        }
    }

    read(security, id, identifier).await
}

pub async fn delete(
    security: &SecurityGroupClient,
    id: &ResourceId,
    identifier: &str,
) -> ProviderResult<()> {
    match security.delete(identifier).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(api_error("delete_security_group", id, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_value(direction: &str, port: i64) -> Value {
        let mut map = HashMap::new();
        map.insert("direction".to_string(), Value::string(direction));
        map.insert("protocol".to_string(), Value::string("tcp"));
        map.insert("port_range_min".to_string(), Value::Int(port));
        map.insert("port_range_max".to_string(), Value::Int(port));
        map.insert("remote_ip_prefix".to_string(), Value::string("0.0.0.0/0"));
        Value::Map(map)
    }

    fn remote_rule(id: &str, direction: &str, port: i64) -> SecurityGroupRule {
        SecurityGroupRule {
            id: id.to_string(),
            direction: direction.to_string(),
            protocol: Some("tcp".to_string()),
            port_range_min: Some(port),
            port_range_max: Some(port),
            remote_ip_prefix: Some("0.0.0.0/0".to_string()),
            description: None,
        }
    }

    #[test]
    fn ingress_only_rule_set_is_rejected() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "rules".to_string(),
            Value::List(vec![rule_value("ingress", 22)]),
        );
        let rules = expand_rules(&attrs).unwrap();
        let id = ResourceId::new("security_group", "web");
        assert!(require_egress(&rules, &id).is_err());
    }

    #[test]
    fn mixed_rule_set_passes_egress_check() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "rules".to_string(),
            Value::List(vec![rule_value("ingress", 443), rule_value("egress", 0)]),
        );
        let rules = expand_rules(&attrs).unwrap();
        let id = ResourceId::new("security_group", "web");
        assert!(require_egress(&rules, &id).is_ok());
    }

    #[test]
    fn two_rules_round_trip_in_the_same_representation() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::string("web"));
        attrs.insert(
            "rules".to_string(),
            Value::List(vec![rule_value("ingress", 443), rule_value("egress", 53)]),
        );

        let specs = expand_rules(&attrs).unwrap();
        let group = SecurityGroup {
            id: "sg-1".to_string(),
            name: "web".to_string(),
            description: None,
            security_group_rules: specs
                .iter()
                .enumerate()
                .map(|(i, s)| SecurityGroupRule {
                    id: format!("r-{}", i),
                    direction: s.direction.clone(),
                    protocol: s.protocol.clone(),
                    port_range_min: s.port_range_min,
                    port_range_max: s.port_range_max,
                    remote_ip_prefix: s.remote_ip_prefix.clone(),
                    description: s.description.clone(),
                })
                .collect(),
        };

        let flattened = flatten(&group);
        assert_eq!(flattened.get("rules"), attrs.get("rules"));
    }

    #[test]
    fn diff_rules_finds_additions_and_removals() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "rules".to_string(),
            Value::List(vec![rule_value("ingress", 443), rule_value("egress", 0)]),
        );
        let desired = expand_rules(&attrs).unwrap();

        let current = vec![
            remote_rule("r-1", "ingress", 443), // kept
            remote_rule("r-2", "ingress", 22),  // removed
        ];

        let (to_add, to_remove) = diff_rules(&desired, &current);
        assert_eq!(to_add.len(), 1);
        assert_eq!(to_add[0].direction, "egress");
        assert_eq!(to_remove, vec!["r-2".to_string()]);
    }

    #[test]
    fn diff_rules_converged_set_is_empty() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "rules".to_string(),
            Value::List(vec![rule_value("egress", 0)]),
        );
        let desired = expand_rules(&attrs).unwrap();
        let current = vec![remote_rule("r-1", "egress", 0)];

        let (to_add, to_remove) = diff_rules(&desired, &current);
        assert!(to_add.is_empty());
        assert!(to_remove.is_empty());
    }
}
