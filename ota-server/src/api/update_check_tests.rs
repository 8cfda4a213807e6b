use axum::http::{HeaderName, HeaderValue, StatusCode};
use serde_json::Value;

use ota_types::{DevicePolicy, MacAddress};

use super::update_check::DEVICE_AUTH_HEADER;
use crate::test_helpers::test_server;

const MAC: &str = "AA:BB:CC:DD:EE:FF";
/// Token for `MAC` under the test fleet secret.
const TOKEN: &str = "E5349A7F";

fn mac() -> MacAddress {
    MacAddress::parse(MAC).unwrap()
}

fn auth(token: &'static str) -> (HeaderName, HeaderValue) {
    (HeaderName::from_static(DEVICE_AUTH_HEADER), HeaderValue::from_static(token))
}

fn policy(target: &str) -> DevicePolicy {
    DevicePolicy::new(
        "panic-button-01",
        target,
        "http://ota.test/firmware/pb-1.2.1.bin",
        "5d41402abc4b2a76b9719d911017c592",
    )
    .with_hardware_version("esp32")
}

#[tokio::test]
async fn test_poll_returns_update_when_target_is_newer() {
    let (server, state, _tmp) = test_server();
    state.registry().upsert(&mac(), policy("1.2.1")).await.unwrap();

    let (name, value) = auth(TOKEN);
    let response = server
        .get("/api/firmware")
        .add_query_param("device_id", "panic-button-01")
        .add_query_param("hardware", "esp32")
        .add_query_param("version", "1.2.0")
        .add_query_param("mac", MAC)
        .add_header(name, value)
        .add_header(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("192.168.1.50"),
        )
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["update_available"], true);
    assert_eq!(body["firmware_version"], "1.2.1");
    assert_eq!(body["firmware_url"], "http://ota.test/firmware/pb-1.2.1.bin");
    assert_eq!(body["checksum"], "5d41402abc4b2a76b9719d911017c592");

    let stored = state.registry().get(&mac()).await.unwrap();
    assert_eq!(stored.current_version.as_deref(), Some("1.2.0"));
    assert_eq!(stored.source_address.as_deref(), Some("192.168.1.50"));
    assert!(stored.last_check.is_some());
}

#[tokio::test]
async fn test_poll_up_to_date_device_gets_bare_answer() {
    let (server, state, _tmp) = test_server();
    state.registry().upsert(&mac(), policy("1.2.1")).await.unwrap();

    let (name, value) = auth("e5349a7f");
    let response = server
        .get("/api/firmware")
        .add_query_param("device_id", "panic-button-01")
        .add_query_param("hardware", "esp32")
        .add_query_param("version", "1.2.1")
        .add_query_param("mac", "aa-bb-cc-dd-ee-ff")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, serde_json::json!({"update_available": false}));
}

#[tokio::test]
async fn test_poll_unregistered_device_is_forbidden() {
    let (server, _state, _tmp) = test_server();

    let (name, value) = auth(TOKEN);
    let response = server
        .get("/api/firmware")
        .add_query_param("device_id", "x")
        .add_query_param("hardware", "esp32")
        .add_query_param("version", "1.0.0")
        .add_query_param("mac", MAC)
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"], "Device not authorized");
}

#[tokio::test]
async fn test_poll_wrong_token_is_unauthorized_and_not_recorded() {
    let (server, state, _tmp) = test_server();
    state.registry().upsert(&mac(), policy("1.2.1")).await.unwrap();

    let (name, value) = auth("DEADBEEF");
    let response = server
        .get("/api/firmware")
        .add_query_param("device_id", "panic-button-01")
        .add_query_param("hardware", "esp32")
        .add_query_param("version", "1.2.0")
        .add_query_param("mac", MAC)
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Authentication failed");

    let stored = state.registry().get(&mac()).await.unwrap();
    assert!(stored.last_check.is_none());
    assert!(stored.current_version.is_none());
}

#[tokio::test]
async fn test_poll_missing_parameters_is_bad_request() {
    let (server, state, _tmp) = test_server();
    state.registry().upsert(&mac(), policy("1.2.1")).await.unwrap();

    // No auth header.
    let response = server
        .get("/api/firmware")
        .add_query_param("device_id", "panic-button-01")
        .add_query_param("hardware", "esp32")
        .add_query_param("version", "1.2.0")
        .add_query_param("mac", MAC)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());

    // No query at all.
    let (name, value) = auth(TOKEN);
    let response = server.get("/api/firmware").add_header(name, value).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_poll_malformed_inputs_are_bad_request() {
    let (server, state, _tmp) = test_server();
    state.registry().upsert(&mac(), policy("1.2.1")).await.unwrap();

    for (mac_param, version) in [("AA:BB:CC", "1.2.0"), (MAC, "1.2.x"), (MAC, "1.2.3.4")] {
        let (name, value) = auth(TOKEN);
        let response = server
            .get("/api/firmware")
            .add_query_param("device_id", "panic-button-01")
            .add_query_param("hardware", "esp32")
            .add_query_param("version", version)
            .add_query_param("mac", mac_param)
            .add_header(name, value)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    let stored = state.registry().get(&mac()).await.unwrap();
    assert!(stored.last_check.is_none());
}

#[tokio::test]
async fn test_firmware_download_and_health() {
    let (server, state, _tmp) = test_server();
    tokio::fs::write(state.firmware().dir().join("pb-1.2.1.bin"), b"hello")
        .await
        .unwrap();

    let response = server.get("/firmware/pb-1.2.1.bin").await;
    response.assert_status_ok();
    assert_eq!(&response.as_bytes()[..], b"hello");

    server.get("/firmware/missing.bin").await.assert_status(StatusCode::NOT_FOUND);

    let health: Value = server.get("/healthz").await.json();
    assert_eq!(health["status"], "ok");

    let status: Value = server.get("/status").await.json();
    assert_eq!(status["status"], "ok");
    assert!(status["timestamp"].is_string());
}

#[tokio::test]
async fn test_unknown_public_path_is_json_404() {
    let (server, _state, _tmp) = test_server();
    let response = server.get("/nope").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Not found");
}
