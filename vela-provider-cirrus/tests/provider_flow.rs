//! End-to-end handler flows through the Provider trait against a mocked
//! platform API.

use std::collections::HashMap;

use serde_json::json;
use vela_core::provider::Provider;
use vela_core::resource::{Resource, ResourceId, Value};
use vela_provider_cirrus::{CirrusProvider, ProviderConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn provider(server: &MockServer) -> CirrusProvider {
    let config = ProviderConfig::new("test-token", 1, 7).with_api_url(server.uri());
    CirrusProvider::connect(config).await.unwrap()
}

fn rule(direction: &str, port: i64) -> Value {
    let mut map = HashMap::new();
    map.insert("direction".to_string(), Value::string(direction));
    map.insert("protocol".to_string(), Value::string("tcp"));
    map.insert("port_range_min".to_string(), Value::Int(port));
    map.insert("port_range_max".to_string(), Value::Int(port));
    map.insert("remote_ip_prefix".to_string(), Value::string("0.0.0.0/0"));
    Value::Map(map)
}

#[tokio::test]
async fn security_group_create_flow() {
    let server = MockServer::start().await;

    let group_body = json!({
        "id": "sg-1",
        "name": "web",
        "description": "web tier",
        "security_group_rules": [
            {"id": "r-1", "direction": "ingress", "protocol": "tcp",
             "port_range_min": 443, "port_range_max": 443, "remote_ip_prefix": "0.0.0.0/0"},
            {"id": "r-2", "direction": "egress", "protocol": "tcp",
             "port_range_min": 53, "port_range_max": 53, "remote_ip_prefix": "0.0.0.0/0"}
        ]
    });
    Mock::given(method("POST"))
        .and(path("/v1/securitygroups/1/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_body.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/securitygroups/1/7/sg-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(group_body))
        .mount(&server)
        .await;

    let provider = provider(&server).await;
    let resource = Resource::new("security_group", "web")
        .with_attribute("name", Value::string("web"))
        .with_attribute("description", Value::string("web tier"))
        .with_attribute(
            "rules",
            Value::List(vec![rule("ingress", 443), rule("egress", 53)]),
        );

    let state = provider.create(&resource).await.unwrap();
    assert!(state.exists);
    assert_eq!(state.identifier.as_deref(), Some("sg-1"));
    let rules = state.attributes.get("rules").and_then(Value::as_list).unwrap();
    assert_eq!(rules.len(), 2);
}

#[tokio::test]
async fn security_group_without_egress_fails_before_any_call() {
    let server = MockServer::start().await;
    let provider = provider(&server).await;

    let resource = Resource::new("security_group", "web")
        .with_attribute("name", Value::string("web"))
        .with_attribute("rules", Value::List(vec![rule("ingress", 22)]));

    let err = provider.create(&resource).await.unwrap_err();
    assert!(err.to_string().contains("egress"));

    let requests = server.received_requests().await.unwrap();
    assert!(requests.is_empty(), "no backend call expected, got {requests:?}");
}

#[tokio::test]
async fn instance_create_polls_task_to_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/instances/1/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": ["t-1"]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t-1",
            "state": "success",
            "created_resources": {"instances": ["i-9"]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/1/7/i-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "i-9",
            "name": "web-1",
            "status": "ACTIVE",
            "flavor_id": "g1-standard-2",
            "addresses": ["203.0.113.7"]
        })))
        .mount(&server)
        .await;

    let provider = provider(&server).await;
    let resource = Resource::new("instance", "web-1")
        .with_attribute("name", Value::string("web-1"))
        .with_attribute("flavor_id", Value::string("g1-standard-2"))
        .with_attribute("image_id", Value::string("img-ubuntu-24"));

    let state = provider.create(&resource).await.unwrap();
    assert_eq!(state.identifier.as_deref(), Some("i-9"));
    assert_eq!(
        state.attributes.get("status"),
        Some(&Value::string("ACTIVE"))
    );
}

#[tokio::test]
async fn read_of_missing_resource_clears_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/1/7/i-gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "gone"})))
        .mount(&server)
        .await;

    let provider = provider(&server).await;
    let id = ResourceId::new("instance", "web-1");
    let state = provider.read(&id, Some("i-gone")).await.unwrap();

    assert!(!state.exists);
    assert!(state.identifier.is_none());
}

#[tokio::test]
async fn delete_confirms_disappearance_with_a_404() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/v1/instances/1/7/i-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"tasks": ["t-2"]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/t-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t-2",
            "state": "success"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/1/7/i-9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "gone"})))
        .mount(&server)
        .await;

    let provider = provider(&server).await;
    let id = ResourceId::new("instance", "web-1");
    provider.delete(&id, "i-9").await.unwrap();
}

#[tokio::test]
async fn update_issues_one_call_per_change_group() {
    let server = MockServer::start().await;

    let instance_body = json!({
        "id": "i-9",
        "name": "web-2",
        "status": "ACTIVE",
        "flavor_id": "g1-standard-2",
        "metadata": {"role": "frontend"}
    });
    Mock::given(method("PATCH"))
        .and(path("/v1/instances/1/7/i-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(instance_body.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v1/instances/1/7/i-9/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/1/7/i-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(instance_body))
        .mount(&server)
        .await;

    let provider = provider(&server).await;
    let id = ResourceId::new("instance", "web");

    let mut from_attrs = HashMap::new();
    from_attrs.insert("name".to_string(), Value::string("web-1"));
    let from = vela_core::resource::State::existing(id.clone(), from_attrs);

    let mut metadata = HashMap::new();
    metadata.insert("role".to_string(), Value::string("frontend"));
    let to = Resource::new("instance", "web")
        .with_attribute("name", Value::string("web-2"))
        .with_attribute("metadata", Value::Map(metadata));

    let state = provider.update(&id, "i-9", &from, &to).await.unwrap();
    assert_eq!(state.attributes.get("name"), Some(&Value::string("web-2")));
}
