use incrime::auth::{credentials::EMAIL_TAKEN, ProfileChanges, Registration, Role};
use incrime::Error;

use crate::support::{setup_test_app, PASSWORD};

fn registration(username: &str, email: Option<&str>) -> Registration {
    Registration::user("Ayesha Khan", username, email.map(str::to_string), None, PASSWORD)
}

#[tokio::test]
async fn create_normalizes_identifiers_and_never_stores_plain_secret() {
    let app = setup_test_app().await;
    let store = app.store();

    let account =
        store.create(registration("  Ayesha ", Some("Ayesha@Example.PK "))).await.unwrap();
    assert_eq!(account.username, "ayesha");
    assert_eq!(account.email.as_deref(), Some("ayesha@example.pk"));
    assert_eq!(account.role, Role::User);
    assert!(account.is_active);

    let credentials = store.find_by_login_identifier("AYESHA").await.unwrap().unwrap();
    assert_ne!(credentials.password_hash, PASSWORD);
    assert!(credentials.password_hash.starts_with("$2"));
    assert!(store.verify_secret(&credentials, PASSWORD).await.unwrap());
    assert!(!store.verify_secret(&credentials, "wrong-password").await.unwrap());
}

#[tokio::test]
async fn login_identifier_matches_username_or_email() {
    let app = setup_test_app().await;
    let store = app.store();
    let account = store.create(registration("bilal", Some("bilal@example.pk"))).await.unwrap();

    let by_username = store.find_by_login_identifier("bilal").await.unwrap().unwrap();
    let by_email = store.find_by_login_identifier("BILAL@example.pk").await.unwrap().unwrap();
    assert_eq!(by_username.account.id, account.id);
    assert_eq!(by_email.account.id, account.id);
    assert!(store.find_by_login_identifier("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_or_email_is_a_conflict() {
    let app = setup_test_app().await;
    let store = app.store();
    store.create(registration("sana", Some("sana@example.pk"))).await.unwrap();

    let err = store.create(registration("SANA", Some("other@example.pk"))).await.unwrap_err();
    assert!(matches!(&err, Error::Conflict(msg) if msg == "Username already taken"));

    let err = store.create(registration("sana2", Some("Sana@example.pk"))).await.unwrap_err();
    assert!(matches!(&err, Error::Conflict(msg) if msg == EMAIL_TAKEN));
}

#[tokio::test]
async fn user_registration_requires_a_contact() {
    let app = setup_test_app().await;

    let err = app.store().create(registration("nocontact", None)).await.unwrap_err();
    assert!(matches!(&err, Error::Validation(msg) if msg == "Email or phone number is required"));

    let with_phone =
        Registration::user("Phone Only", "phoneonly", None, Some("+92300000000".into()), PASSWORD);
    let account = app.store().create(with_phone).await.unwrap();
    assert!(account.email.is_none());
    assert_eq!(account.phone.as_deref(), Some("+92300000000"));
}

#[tokio::test]
async fn weak_and_overlong_passwords_are_rejected() {
    let app = setup_test_app().await;
    let store = app.store();

    let mut short = registration("short", Some("short@example.pk"));
    short.password = "abc".into();
    assert!(matches!(store.create(short).await, Err(Error::Validation(_))));

    let mut long = registration("long", Some("long@example.pk"));
    long.password = "x".repeat(73);
    assert!(matches!(store.create(long).await, Err(Error::Validation(_))));
}

#[tokio::test]
async fn secret_at_byte_limit_rejects_longer_candidates() {
    let app = setup_test_app().await;
    let store = app.store();
    let secret = "a".repeat(72);

    let mut limit = registration("limit", Some("limit@example.pk"));
    limit.password = secret.clone();
    store.create(limit).await.unwrap();

    let credentials = store.find_by_login_identifier("limit").await.unwrap().unwrap();
    assert!(store.verify_secret(&credentials, &secret).await.unwrap());
    assert!(!store.verify_secret(&credentials, &format!("{}x", secret)).await.unwrap());
}

#[tokio::test]
async fn set_secret_replaces_the_hash() {
    let app = setup_test_app().await;
    let store = app.store();
    let account = store.create(registration("omar", Some("omar@example.pk"))).await.unwrap();

    store.set_secret(&account.id, "a-brand-new-secret").await.unwrap();

    let credentials = store.find_credentials_by_id(&account.id).await.unwrap().unwrap();
    assert!(store.verify_secret(&credentials, "a-brand-new-secret").await.unwrap());
    assert!(!store.verify_secret(&credentials, PASSWORD).await.unwrap());
}

#[tokio::test]
async fn profile_update_keeps_emails_unique() {
    let app = setup_test_app().await;
    let store = app.store();
    store.create(registration("first", Some("first@example.pk"))).await.unwrap();
    let second = store.create(registration("second", Some("second@example.pk"))).await.unwrap();

    let taken = ProfileChanges { email: Some("FIRST@example.pk".into()), ..Default::default() };
    let err = store.update_profile(&second.id, taken).await.unwrap_err();
    assert!(matches!(&err, Error::Conflict(msg) if msg == EMAIL_TAKEN));

    let changes = ProfileChanges {
        full_name: Some("Second Person".into()),
        email: Some("second@example.pk".into()),
        phone: Some("   ".into()),
    };
    let updated = store.update_profile(&second.id, changes).await.unwrap();
    assert_eq!(updated.full_name, "Second Person");
    assert_eq!(updated.email.as_deref(), Some("second@example.pk"));
    assert!(updated.phone.is_none());
}

#[tokio::test]
async fn toggle_and_delete_affect_only_the_target() {
    let app = setup_test_app().await;
    let store = app.store();
    let keep = store.create(registration("keep", Some("keep@example.pk"))).await.unwrap();
    let target = store.create(registration("target", Some("target@example.pk"))).await.unwrap();

    let toggled = store.toggle_active(&target.id).await.unwrap().unwrap();
    assert!(!toggled.is_active);
    let toggled = store.toggle_active(&target.id).await.unwrap().unwrap();
    assert!(toggled.is_active);

    assert!(store.delete_with_dependents(&target.id).await.unwrap());
    assert!(store.find_by_id(&target.id).await.unwrap().is_none());
    assert!(!store.delete_with_dependents(&target.id).await.unwrap());
    assert!(store.find_by_id(&keep.id).await.unwrap().is_some());
}
