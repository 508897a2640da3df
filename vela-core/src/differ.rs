//! Differ - Compare desired attributes with current state
//!
//! Update handlers group their backend calls by changed attribute, so the
//! differ reports which attributes moved rather than a whole-resource bool.

use std::collections::HashMap;

use crate::resource::{Resource, ResourceId, State, Value};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Resource exists but not in desired state -> needs deletion
    Delete(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = changed_attributes(&desired.attributes, &current.attributes);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find attributes whose desired value differs from the current one
///
/// Attributes absent from the desired set are left alone; the backend owns
/// computed values the user never declared.
pub fn changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed: Vec<String> = desired
        .iter()
        .filter(|(key, desired_value)| match current.get(key.as_str()) {
            Some(current_value) => current_value != *desired_value,
            None => true,
        })
        .map(|(key, _)| key.clone())
        .collect();
    changed.sort();
    changed
}

/// Returns true if the named attribute differs between the two sets
pub fn attribute_changed(
    name: &str,
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> bool {
    match (desired.get(name), current.get(name)) {
        (Some(d), Some(c)) => d != c,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("bucket", "test");
        let current = State::not_found(ResourceId::new("bucket", "test"));

        let result = diff(&desired, &current);
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_same() {
        let desired =
            Resource::new("bucket", "test").with_attribute("region", Value::string("lux-1"));

        let mut attrs = HashMap::new();
        attrs.insert("region".to_string(), Value::string("lux-1"));
        let current = State::existing(ResourceId::new("bucket", "test"), attrs);

        let result = diff(&desired, &current);
        assert!(matches!(result, Diff::NoChange(_)));
    }

    #[test]
    fn diff_update_when_different() {
        let desired =
            Resource::new("bucket", "test").with_attribute("region", Value::string("ams-2"));

        let mut attrs = HashMap::new();
        attrs.insert("region".to_string(), Value::string("lux-1"));
        let current = State::existing(ResourceId::new("bucket", "test"), attrs);

        let result = diff(&desired, &current);
        match result {
            Diff::Update {
                changed_attributes, ..
            } => {
                assert!(changed_attributes.contains(&"region".to_string()));
            }
            _ => panic!("Expected Update"),
        }
    }

    #[test]
    fn computed_attributes_do_not_trigger_updates() {
        let desired = Resource::new("loadbalancer", "lb");

        let mut attrs = HashMap::new();
        attrs.insert("vip_address".to_string(), Value::string("203.0.113.7"));
        let current = State::existing(ResourceId::new("loadbalancer", "lb"), attrs);

        let result = diff(&desired, &current);
        assert!(matches!(result, Diff::NoChange(_)));
    }

    #[test]
    fn attribute_changed_detects_single_field() {
        let mut desired = HashMap::new();
        desired.insert("name".to_string(), Value::string("after"));
        let mut current = HashMap::new();
        current.insert("name".to_string(), Value::string("before"));
        current.insert("flavor".to_string(), Value::string("g1-standard-2"));

        assert!(attribute_changed("name", &desired, &current));
        assert!(!attribute_changed("flavor", &desired, &current));
    }
}
