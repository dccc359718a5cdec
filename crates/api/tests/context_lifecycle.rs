//! AppContext construction and startup.

mod support;

use homedash_api::AppContext;
use homedash_domain::HomedashError;
use serde_json::json;
use support::{config, context, mount_subscriptions};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn insecure_server_url_is_rejected_at_construction() {
    let mut config = config();
    config.backend.server_url = "http://backend.example.com/parse".into();

    let err = AppContext::new(config).unwrap_err();
    assert!(matches!(err, HomedashError::Config(_)), "unexpected error: {err:?}");
}

#[test]
fn session_file_setting_is_accepted() {
    let dir = TempDir::new().unwrap();
    let mut config = config();
    config.server.session_file = Some(dir.path().join("session.json").to_string_lossy().into_owned());

    let context = AppContext::new(config).unwrap();
    assert!(!context.auth().is_authenticated());
    assert!(!context.backend().is_initialized());
}

#[tokio::test]
async fn start_tolerates_an_unreachable_backend() {
    let server = MockServer::start().await;
    mount_subscriptions(&server, 500, json!([])).await;
    let context = context(&server);

    context.start().await.unwrap();

    assert!(!context.backend().is_initialized());
    assert!(!context.auth().is_authenticated());
}

#[tokio::test]
async fn start_initializes_the_backend_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/classes/subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;
    let context = context(&server);

    context.start().await.unwrap();
    context.start().await.unwrap();

    assert!(context.backend().is_initialized());
}
