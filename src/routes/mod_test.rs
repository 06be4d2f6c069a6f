use super::*;
use axum::body::Body;
use axum::http::{Request, header};
use tower::ServiceExt;

use crate::state::test_helpers;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::ORIGIN, "http://example.test")
        .body(Body::empty())
        .expect("request should build")
}

#[tokio::test]
async fn healthz_returns_ok() {
    let app = app(test_helpers::test_app_state(), &Config::default());
    let response = app.oneshot(get("/healthz")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_boxes_returns_json_snapshot_with_cors() {
    let state = test_helpers::test_app_state();
    let seeded = test_helpers::seed_box(&state, "hello", 3.0, 4.0).await;
    let app = app(state, &Config::default());

    let response = app.oneshot(get("/api/boxes")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value: serde_json::Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(value[&seeded.id]["text"], "hello");
    assert_eq!(value[&seeded.id]["createdBy"], "seed");
    assert_eq!(value[&seeded.id]["position"]["x"], 3.0);
}

#[tokio::test]
async fn plain_get_on_ws_route_is_not_upgraded() {
    let app = app(test_helpers::test_app_state(), &Config::default());
    let response = app.oneshot(get("/ws")).await.expect("response");
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn unknown_route_is_not_found_without_static_dir() {
    let app = app(test_helpers::test_app_state(), &Config::default());
    let response = app.oneshot(get("/nope")).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Static directory
// =============================================================================

fn static_config(dir: &tempfile::TempDir) -> Config {
    std::fs::write(dir.path().join("index.html"), "<h1>boxes</h1>").expect("write index");
    Config { static_dir: Some(dir.path().to_path_buf()), ..Config::default() }
}

#[tokio::test]
async fn static_dir_serves_index_at_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app(test_helpers::test_app_state(), &static_config(&dir));

    let response = app.oneshot(get("/")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(&body[..], b"<h1>boxes</h1>");
}

#[tokio::test]
async fn static_dir_keeps_ws_and_api_routes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app(test_helpers::test_app_state(), &static_config(&dir));

    let ws = app.clone().oneshot(get("/ws")).await.expect("response");
    assert!(ws.status().is_client_error());
    assert_ne!(ws.status(), StatusCode::NOT_FOUND, "/ws must not fall through to files");

    let api = app.oneshot(get("/api/boxes")).await.expect("response");
    assert_eq!(api.status(), StatusCode::OK);
}

#[tokio::test]
async fn static_dir_missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = app(test_helpers::test_app_state(), &static_config(&dir));
    let response = app.oneshot(get("/missing.js")).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
