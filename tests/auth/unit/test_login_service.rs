use incrime::auth::login_service::{ACCOUNT_DEACTIVATED, INVALID_CREDENTIALS};
use incrime::auth::{AuthError, Registration, Role, TokenKind, TokenService};
use incrime::errors::AuthErrorType;
use incrime::Error;

use crate::support::{setup_test_app, PASSWORD};

fn token_service(app: &crate::support::TestApp) -> TokenService {
    TokenService::new(&app.auth.jwt_secret, &app.auth.jwt_refresh_secret).unwrap()
}

#[tokio::test]
async fn register_issues_both_tokens_for_a_user_account() {
    let app = setup_test_app().await;

    let session = app
        .state
        .login
        .register(Registration::user("Zara Ali", "zara", Some("zara@example.pk".into()), None, PASSWORD))
        .await
        .unwrap();

    assert_eq!(session.account.role, Role::User);
    let tokens = token_service(&app);
    assert_eq!(tokens.verify(&session.access_token, TokenKind::Access).unwrap(), session.account.id);
    assert_eq!(tokens.verify(&session.refresh_token, TokenKind::Refresh).unwrap(), session.account.id);
}

#[tokio::test]
async fn unknown_user_and_wrong_password_fail_identically() {
    let app = setup_test_app().await;
    app.create_account("hamza", "hamza@example.pk", Role::User).await;

    let unknown = app.state.login.login("nobody", PASSWORD).await.unwrap_err();
    let wrong = app.state.login.login("hamza", "not-the-password").await.unwrap_err();

    for err in [unknown, wrong] {
        match err {
            Error::Auth { message, error_type } => {
                assert_eq!(message, INVALID_CREDENTIALS);
                assert_eq!(error_type, AuthErrorType::InvalidCredentials);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[tokio::test]
async fn deactivation_is_only_revealed_after_a_correct_password() {
    let app = setup_test_app().await;
    let account = app.create_account("inactive", "inactive@example.pk", Role::User).await;
    app.store().toggle_active(&account.id).await.unwrap();

    let wrong = app.state.login.login("inactive", "not-the-password").await.unwrap_err();
    assert!(matches!(&wrong, Error::Auth { message, .. } if message == INVALID_CREDENTIALS));

    let right = app.state.login.login("inactive", PASSWORD).await.unwrap_err();
    assert!(matches!(&right, Error::Auth { message, .. } if message == ACCOUNT_DEACTIVATED));
}

#[tokio::test]
async fn login_stamps_last_login() {
    let app = setup_test_app().await;
    let account = app.create_account("stamp", "stamp@example.pk", Role::User).await;
    assert!(account.last_login_at.is_none());

    let session = app.state.login.login("stamp@example.pk", PASSWORD).await.unwrap();
    assert!(session.account.last_login_at.is_some());

    let stored = app.store().find_by_id(&account.id).await.unwrap().unwrap();
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn missing_fields_are_a_validation_error() {
    let app = setup_test_app().await;

    assert!(matches!(app.state.login.login("", PASSWORD).await, Err(Error::Validation(_))));
    assert!(matches!(app.state.login.login("someone", "").await, Err(Error::Validation(_))));
}

#[tokio::test]
async fn refresh_requires_a_refresh_token_for_a_live_account() {
    let app = setup_test_app().await;
    app.create_account("refresher", "refresher@example.pk", Role::User).await;
    let session = app.state.login.login("refresher", PASSWORD).await.unwrap();

    let access = app.state.login.refresh(&session.refresh_token).await.unwrap();
    let tokens = token_service(&app);
    assert_eq!(tokens.verify(&access, TokenKind::Access).unwrap(), session.account.id);

    // An access token is not accepted where a refresh token is expected.
    let err = app.state.login.refresh(&session.access_token).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenFailed));

    app.store().delete_with_dependents(&session.account.id).await.unwrap();
    let err = app.state.login.refresh(&session.refresh_token).await.unwrap_err();
    assert!(matches!(err, AuthError::AccountNotFound));
}
