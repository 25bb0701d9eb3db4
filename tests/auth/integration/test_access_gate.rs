use axum::http::{Method, StatusCode};
use incrime::auth::{Role, TokenKind, TokenService};
use incrime::domain::UserId;
use serde_json::{json, Value};

use crate::support::{read_json, send_request, setup_test_app, PASSWORD};

async fn expect_rejection(response: axum::response::Response, status: StatusCode, message: &str) {
    assert_eq!(response.status(), status);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({ "success": false, "message": message }));
}

#[tokio::test]
async fn missing_or_malformed_tokens_are_rejected() {
    let app = setup_test_app().await;

    let response = send_request(&app, Method::GET, "/api/auth/me", None, None).await;
    expect_rejection(response, StatusCode::UNAUTHORIZED, "Not authorized, no token").await;

    let response =
        send_request(&app, Method::GET, "/api/auth/me", Some("not-a-valid-token"), None).await;
    expect_rejection(response, StatusCode::UNAUTHORIZED, "Not authorized, token failed").await;
}

#[tokio::test]
async fn refresh_token_cannot_open_the_gate() {
    let app = setup_test_app().await;
    let account = app.create_account("gate", "gate@example.pk", Role::User).await;

    let tokens = TokenService::new(&app.auth.jwt_secret, &app.auth.jwt_refresh_secret).unwrap();
    let refresh = tokens.issue_refresh(&account.id).unwrap();

    let response = send_request(&app, Method::GET, "/api/auth/me", Some(&refresh), None).await;
    expect_rejection(response, StatusCode::UNAUTHORIZED, "Not authorized, token failed").await;
}

#[tokio::test]
async fn token_for_a_missing_account_is_rejected() {
    let app = setup_test_app().await;
    let tokens = TokenService::new(&app.auth.jwt_secret, &app.auth.jwt_refresh_secret).unwrap();
    let orphan = tokens.issue_access(&UserId::new()).unwrap();

    let response = send_request(&app, Method::GET, "/api/auth/me", Some(&orphan), None).await;
    expect_rejection(response, StatusCode::UNAUTHORIZED, "User not found").await;
}

#[tokio::test]
async fn deactivation_takes_effect_on_the_next_request() {
    let app = setup_test_app().await;
    let account = app.create_account("revoked", "revoked@example.pk", Role::User).await;
    let token = app.login("revoked", PASSWORD).await;

    let response = send_request(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["user"]["id"], account.id.to_string());

    app.store().toggle_active(&account.id).await.unwrap();

    let response = send_request(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    expect_rejection(response, StatusCode::UNAUTHORIZED, "Account is deactivated").await;
}

#[tokio::test]
async fn admin_routes_require_the_admin_role() {
    let app = setup_test_app().await;
    let target = app.create_account("target", "target@example.pk", Role::User).await;
    app.create_account("plain", "plain@example.pk", Role::User).await;
    let token = app.login("plain", PASSWORD).await;

    let path = format!("/api/admin/users/{}/toggle", target.id);

    let response = send_request(&app, Method::PUT, &path, None, None).await;
    expect_rejection(response, StatusCode::UNAUTHORIZED, "Not authorized, no token").await;

    let response = send_request(&app, Method::PUT, &path, Some(&token), None).await;
    expect_rejection(response, StatusCode::FORBIDDEN, "Access denied: Admins only").await;

    // The forbidden request changed nothing.
    let stored = app.store().find_by_id(&target.id).await.unwrap().unwrap();
    assert!(stored.is_active);
}

#[tokio::test]
async fn me_returns_the_redacted_account() {
    let app = setup_test_app().await;
    app.create_account("whoami", "whoami@example.pk", Role::User).await;
    let token = app.login("whoami@example.pk", PASSWORD).await;

    let response = send_request(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "whoami");
    assert!(body["user"].get("passwordHash").is_none());
    assert!(body.get("message").is_none());
}

#[test]
fn token_kinds_have_distinct_lifetimes() {
    assert!(TokenKind::Refresh.lifetime() > TokenKind::Access.lifetime());
}
