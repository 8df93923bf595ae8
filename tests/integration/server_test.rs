//! HTTP surface tests driven through the axum router in-process.

use crate::fixtures::{test_config, ScriptedBackend};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use nestgate::clock::ManualClock;
use nestgate::gateway::ChatGateway;
use nestgate::server::{build_app, AppState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app(backend: Arc<ScriptedBackend>, api_key: Option<&str>) -> axum::Router {
    let gateway = ChatGateway::with_backend(&test_config(), backend, Arc::new(ManualClock::new()));
    let metrics_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .build_recorder()
        .handle();
    build_app(Arc::new(AppState {
        gateway,
        api_key: api_key.map(|k| k.to_string()),
        metrics_handle,
    }))
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_chat_round_trip() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok(
        "Sure, here are two listings near the river.".to_string(),
    )]));
    let app = test_app(backend, None);

    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "anything near the river?"}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["model"], "alpha");
    assert_eq!(body["cached"], false);
    assert!(body["message"].as_str().unwrap().contains("listings"));
}

#[tokio::test]
async fn test_chat_rejects_empty_messages() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let app = test_app(backend.clone(), None);

    let response = app
        .oneshot(chat_request(json!({"messages": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn test_failed_dispatch_maps_to_service_unavailable() {
    let backend = Arc::new(ScriptedBackend::repeating_api_error(
        503,
        "Service Unavailable",
    ));
    let app = test_app(backend, None);

    let response = app
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
}

#[tokio::test]
async fn test_api_key_required_when_configured() {
    let backend = Arc::new(ScriptedBackend::new(vec![Ok("answer".to_string())]));
    let app = test_app(backend, Some("sekrit"));

    let response = app
        .clone()
        .oneshot(chat_request(json!({
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut authed = chat_request(json!({
        "messages": [{"role": "user", "content": "hello"}]
    }));
    authed
        .headers_mut()
        .insert("authorization", "Bearer sekrit".parse().unwrap());
    let response = app.oneshot(authed).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_stays_open_with_api_key() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let app = test_app(backend, Some("sekrit"));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_admin_status_reports_catalog_shape() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let app = test_app(backend, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["models"], 3);
    assert_eq!(body["tiers"], 2);
    assert_eq!(body["credentials"], 2);
    assert_eq!(body["sticky_model"], "alpha");
}

#[tokio::test]
async fn test_admin_cache_clear_route() {
    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let app = test_app(backend, None);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/cache/clear")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["cleared"], true);
}
