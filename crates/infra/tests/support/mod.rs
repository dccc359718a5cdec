//! Shared fixtures for adapter tests against a wiremock backend.
#![allow(dead_code)]

use std::time::Duration;

use homedash_domain::{ConnectionConfig, RetryPolicy};
use homedash_infra::{BackendRestAdapter, HttpClient};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const APP_ID: &str = "app-id";
pub const REST_KEY: &str = "rest-key";
pub const MASTER_KEY: &str = "master-key";

pub fn connection() -> ConnectionConfig {
    ConnectionConfig::new(APP_ID, REST_KEY, None, "https://backend.example.com/parse")
}

pub fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_retries(max_retries)
        .with_delays(Duration::from_millis(2), Duration::from_millis(10))
}

/// Adapter whose transport points at `server`; not yet initialized.
pub fn adapter_with(server: &MockServer, connection: ConnectionConfig) -> BackendRestAdapter {
    let http = HttpClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(2))
        .retry_policy(fast_retry(2))
        .build()
        .expect("http client");
    BackendRestAdapter::with_http_client(connection, http).expect("valid connection")
}

pub fn adapter(server: &MockServer) -> BackendRestAdapter {
    adapter_with(server, connection())
}

/// Answer the readiness probe with `status`.
pub async fn mount_probe(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/classes/subscription"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"results": []})))
        .mount(server)
        .await;
}

pub fn body_of(request: &wiremock::Request) -> Value {
    serde_json::from_slice(&request.body).expect("json body")
}

/// Decoded `where` parameter of a recorded query.
pub fn where_of(request: &wiremock::Request) -> Option<Value> {
    request
        .url
        .query_pairs()
        .find(|(key, _)| key == "where")
        .map(|(_, value)| serde_json::from_str(&value).expect("where is json"))
}

pub fn query_param(request: &wiremock::Request, name: &str) -> Option<String> {
    request.url.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
}
