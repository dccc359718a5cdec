//! Router fixtures backed by a wiremock backend.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use homedash_api::{build_router, AppContext};
use homedash_domain::{Config, ConnectionConfig, HttpConfig, RetryPolicy, ServerConfig};
use homedash_infra::{BackendRestAdapter, HttpClient, MemorySessionStore};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn config() -> Config {
    Config {
        backend: ConnectionConfig::new("app-id", "rest-key", None, "https://backend.example.com/parse"),
        http: HttpConfig::default(),
        server: ServerConfig::default(),
    }
}

/// Context whose backend adapter talks to `server`.
pub fn context(server: &MockServer) -> Arc<AppContext> {
    let config = config();
    let http = HttpClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(2))
        .retry_policy(
            RetryPolicy::default()
                .with_max_retries(1)
                .with_delays(Duration::from_millis(2), Duration::from_millis(5)),
        )
        .build()
        .expect("http client");
    let backend = BackendRestAdapter::with_http_client(config.backend.clone(), http)
        .expect("valid connection");

    Arc::new(AppContext::from_parts(config, Arc::new(backend), Arc::new(MemorySessionStore::new())))
}

pub fn router(server: &MockServer) -> (Arc<AppContext>, Router) {
    let context = context(server);
    (Arc::clone(&context), build_router(context))
}

/// Answer the readiness probe (and subscription listings) with `results`.
pub async fn mount_subscriptions(server: &MockServer, status: u16, results: Value) {
    Mock::given(method("GET"))
        .and(path("/classes/subscription"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "results": results })))
        .mount(server)
        .await;
}

pub async fn mount_foods(server: &MockServer, results: Value) {
    Mock::given(method("GET"))
        .and(path("/classes/food"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(server)
        .await;
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
    (status, body)
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::get(uri).body(Body::empty()).expect("request")).await
}

pub async fn delete(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Request::delete(uri).body(Body::empty()).expect("request")).await
}

pub async fn post_json(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send_json(router, "POST", uri, body.to_string()).await
}

pub async fn put_json(router: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send_json(router, "PUT", uri, body.to_string()).await
}

pub async fn send_json(router: &Router, method: &str, uri: &str, body: String) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request");
    send(router, request).await
}
