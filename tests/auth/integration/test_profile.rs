use axum::http::{Method, StatusCode};
use incrime::auth::Role;
use serde_json::{json, Value};

use crate::support::{read_json, send_request, setup_test_app, PASSWORD};

#[tokio::test]
async fn profile_update_applies_non_blank_fields() {
    let app = setup_test_app().await;
    app.create_account("profile", "profile@example.pk", Role::User).await;
    let token = app.login("profile", PASSWORD).await;

    let response = send_request(
        &app,
        Method::PUT,
        "/api/auth/profile",
        Some(&token),
        Some(json!({ "fullName": "Updated Name", "email": "New@Example.pk", "phone": "" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Profile updated");
    assert_eq!(body["user"]["fullName"], "Updated Name");
    assert_eq!(body["user"]["email"], "new@example.pk");
}

#[tokio::test]
async fn profile_update_rejects_a_taken_email() {
    let app = setup_test_app().await;
    app.create_account("owner", "owner@example.pk", Role::User).await;
    app.create_account("other", "other@example.pk", Role::User).await;
    let token = app.login("other", PASSWORD).await;

    let response = send_request(
        &app,
        Method::PUT,
        "/api/auth/profile",
        Some(&token),
        Some(json!({ "email": "owner@example.pk" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Email already registered");
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = setup_test_app().await;
    app.create_account("changer", "changer@example.pk", Role::User).await;
    let token = app.login("changer", PASSWORD).await;

    let response = send_request(
        &app,
        Method::PUT,
        "/api/auth/password",
        Some(&token),
        Some(json!({ "currentPassword": "wrong-password", "newPassword": "brand-new-secret" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Current password is incorrect");

    let response = send_request(
        &app,
        Method::PUT,
        "/api/auth/password",
        Some(&token),
        Some(json!({ "currentPassword": PASSWORD, "newPassword": "brand-new-secret" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Password updated successfully");

    app.login("changer", "brand-new-secret").await;
}
