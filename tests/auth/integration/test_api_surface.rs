use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use crate::support::{read_json, send_raw, send_request, setup_test_app};

#[tokio::test]
async fn health_reports_running() {
    let app = setup_test_app().await;

    let response = send_request(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "InCrime API is running");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn unknown_routes_get_a_json_404() {
    let app = setup_test_app().await;

    let response = send_request(&app, Method::GET, "/api/does-not-exist", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({ "success": false, "message": "Route /api/does-not-exist not found" }));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request_envelope() {
    let app = setup_test_app().await;

    let response = send_raw(&app, Method::POST, "/api/auth/login", "{not json").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid JSON request body");
}

#[tokio::test]
async fn openapi_document_lists_identity_paths() {
    let app = setup_test_app().await;

    let response = send_request(&app, Method::GET, "/api/docs/openapi.json", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    let paths = body["paths"].as_object().unwrap();
    for path in [
        "/api/auth/login",
        "/api/auth/register",
        "/api/auth/forgot-password",
        "/api/auth/reset-password/{token}",
        "/api/admin/users/{id}",
    ] {
        assert!(paths.contains_key(path), "missing {}", path);
    }
}
