//! Shared HTTP client behavior: auth header, retry, status mapping

use cirrus_sdk::compute::ComputeClient;
use cirrus_sdk::{ApiClient, ApiError};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn instance_body() -> serde_json::Value {
    json!({
        "id": "i-1",
        "name": "web",
        "status": "ACTIVE",
        "flavor_id": "g1-standard-2"
    })
}

#[tokio::test]
async fn auth_header_is_injected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/1/7/i-1"))
        .and(header("Authorization", "APIKey secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(instance_body()))
        .expect(1)
        .mount(&server)
        .await;

    let compute = ComputeClient::new(ApiClient::new(server.uri(), "secret-token").unwrap(), 1, 7);
    let instance = compute.get_instance("i-1").await.unwrap();
    assert_eq!(instance.name, "web");
}

#[tokio::test]
async fn not_found_maps_to_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/1/7/i-gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "no such instance"})))
        .mount(&server)
        .await;

    let compute = ComputeClient::new(ApiClient::new(server.uri(), "t").unwrap(), 1, 7);
    let err = compute.get_instance("i-gone").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/1/7/i-1"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/1/7/i-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(instance_body()))
        .mount(&server)
        .await;

    let compute = ComputeClient::new(ApiClient::new(server.uri(), "t").unwrap(), 1, 7);
    let instance = compute.get_instance("i-1").await.unwrap();
    assert_eq!(instance.id, "i-1");
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/instances/1/7/i-1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad token"})))
        .expect(1)
        .mount(&server)
        .await;

    let compute = ComputeClient::new(ApiClient::new(server.uri(), "t").unwrap(), 1, 7);
    let err = compute.get_instance("i-1").await.unwrap_err();
    match err {
        ApiError::Auth(message) => assert_eq!(message, "bad token"),
        other => panic!("expected Auth, got {other:?}"),
    }
}

#[tokio::test]
async fn per_product_base_url_override() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tasks/t-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "t-1",
            "state": "success"
        })))
        .mount(&server)
        .await;

    // Construct against a bogus base, then rebase onto the mock
    let api = ApiClient::new("https://unused.invalid", "t").unwrap();
    let rebased = api.with_base_url(server.uri());
    let tasks = cirrus_sdk::TasksClient::new(rebased);
    let task = tasks.get("t-1").await.unwrap();
    assert_eq!(task.id, "t-1");
}
