use axum::http::{Method, StatusCode};
use chrono::Utc;
use incrime::auth::Role;
use incrime::domain::{ApplicationId, UserId};
use serde_json::Value;

use crate::support::{read_json, send_request, setup_test_app, TestApp, PASSWORD};

async fn admin_token(app: &TestApp) -> String {
    app.create_account("chief", "chief@example.pk", Role::Admin).await;
    app.login("chief", PASSWORD).await
}

async fn application_count(app: &TestApp, user_id: &UserId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&app.pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn admin_toggles_a_user_back_and_forth() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;
    let user = app.create_account("client", "client@example.pk", Role::User).await;
    let path = format!("/api/admin/users/{}/toggle", user.id);

    let response = send_request(&app, Method::PUT, &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "User deactivated");
    assert_eq!(body["user"]["isActive"], false);

    // The deactivated user can no longer log in.
    let response = send_request(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "username": "client", "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Your account has been deactivated. Contact support.");

    let response = send_request(&app, Method::PUT, &path, Some(&token), None).await;
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "User activated");
    assert_eq!(body["user"]["isActive"], true);
}

#[tokio::test]
async fn admins_are_protected_from_toggle_and_delete() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;
    let other_admin = app.create_account("deputy", "deputy@example.pk", Role::Admin).await;

    let path = format!("/api/admin/users/{}/toggle", other_admin.id);
    let response = send_request(&app, Method::PUT, &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Cannot deactivate admin");

    let path = format!("/api/admin/users/{}", other_admin.id);
    let response = send_request(&app, Method::DELETE, &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "Cannot delete admin");

    assert!(app.store().find_by_id(&other_admin.id).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_removes_the_account_and_its_applications() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;
    let user = app.create_account("leaving", "leaving@example.pk", Role::User).await;
    let user_token = app.login("leaving", PASSWORD).await;

    for _ in 0..2 {
        sqlx::query("INSERT INTO applications (id, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(ApplicationId::new())
            .bind(&user.id)
            .bind(Utc::now().to_rfc3339())
            .execute(&app.pool)
            .await
            .unwrap();
    }
    assert_eq!(application_count(&app, &user.id).await, 2);

    let path = format!("/api/admin/users/{}", user.id);
    let response = send_request(&app, Method::DELETE, &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["message"], "User deleted");

    assert_eq!(application_count(&app, &user.id).await, 0);
    assert!(app.store().find_by_id(&user.id).await.unwrap().is_none());

    // Tokens for the deleted account stop working immediately.
    let response = send_request(&app, Method::GET, "/api/auth/me", Some(&user_token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send_request(&app, Method::DELETE, &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_or_malformed_ids_are_not_found() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;

    for id in [UserId::new().to_string(), "not-a-uuid".to_string()] {
        let path = format!("/api/admin/users/{}/toggle", id);
        let response = send_request(&app, Method::PUT, &path, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value = read_json(response).await;
        assert_eq!(body["message"], "User not found");
    }
}

#[tokio::test]
async fn uppercase_id_addresses_the_same_account() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;
    let user = app.create_account("shouty", "shouty@example.pk", Role::User).await;

    let path = format!("/api/admin/users/{}/toggle", user.id.as_str().to_uppercase());
    let response = send_request(&app, Method::PUT, &path, Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["user"]["id"], user.id.as_str());
    assert_eq!(body["user"]["isActive"], false);
}
