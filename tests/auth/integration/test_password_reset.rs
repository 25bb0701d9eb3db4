use axum::http::{Method, StatusCode};
use incrime::auth::Role;
use incrime::config::DatabaseConfig;
use serde_json::{json, Value};

use crate::support::{
    read_json, send_request, setup_test_app, setup_test_app_with, test_auth_config, PASSWORD,
};

const RESET_MESSAGE: &str = "If this email exists, a reset link has been sent.";

#[tokio::test]
async fn forgot_password_answers_the_same_for_known_and_unknown_emails() {
    let app = setup_test_app().await;
    app.create_account("known", "known@example.pk", Role::User).await;

    for email in ["known@example.pk", "unknown@example.pk"] {
        let response = send_request(
            &app,
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": email })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = read_json(response).await;
        assert_eq!(body, json!({ "success": true, "message": RESET_MESSAGE }));
    }

    assert_eq!(app.delivery.count(), 1);

    let response =
        send_request(&app, Method::POST, "/api/auth/forgot-password", None, Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Email is required");
}

#[tokio::test]
async fn delivery_failure_answers_like_an_unknown_email() {
    let app = setup_test_app().await;
    app.create_account("offline", "offline@example.pk", Role::User).await;
    app.delivery.set_failing(true);

    let mut bodies = Vec::new();
    for email in ["offline@example.pk", "nobody@example.pk"] {
        let response = send_request(
            &app,
            Method::POST,
            "/api/auth/forgot-password",
            None,
            Some(json!({ "email": email })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        bodies.push(read_json::<Value>(response).await);
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[0], json!({ "success": true, "message": RESET_MESSAGE }));
    assert_eq!(app.delivery.count(), 0);
}

#[tokio::test]
async fn reset_password_over_http_is_single_use() {
    let app = setup_test_app().await;
    app.create_account("forgetful", "forgetful@example.pk", Role::User).await;

    send_request(
        &app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "forgetful@example.pk" })),
    )
    .await;
    let raw = app.delivery.last_token_for("forgetful@example.pk").unwrap();
    let path = format!("/api/auth/reset-password/{}", raw);

    let response =
        send_request(&app, Method::POST, &path, None, Some(json!({ "password": "recovered-pass" })))
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({ "success": true, "message": "Password reset successful" }));

    app.login("forgetful", "recovered-pass").await;

    let response =
        send_request(&app, Method::POST, &path, None, Some(json!({ "password": "second-attempt" })))
            .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Invalid or expired reset token");
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let app = setup_test_app().await;
    let path = format!("/api/auth/reset-password/{}", "ab".repeat(32));

    let response =
        send_request(&app, Method::POST, &path, None, Some(json!({ "password": PASSWORD }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn development_echo_includes_the_raw_token() {
    let mut auth = test_auth_config();
    auth.expose_reset_token = true;
    let app = setup_test_app_with(DatabaseConfig::in_memory(), auth).await;
    app.create_account("dev", "dev@example.pk", Role::User).await;

    let response = send_request(
        &app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "dev@example.pk" })),
    )
    .await;
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], RESET_MESSAGE);
    assert_eq!(
        body["resetToken"].as_str().map(str::to_string),
        app.delivery.last_token_for("dev@example.pk")
    );

    // Unknown emails still get no token.
    let response = send_request(
        &app,
        Method::POST,
        "/api/auth/forgot-password",
        None,
        Some(json!({ "email": "nobody@example.pk" })),
    )
    .await;
    let body: Value = read_json(response).await;
    assert!(body.get("resetToken").is_none());
}
