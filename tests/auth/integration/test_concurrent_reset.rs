use std::sync::Arc;

use incrime::auth::Role;
use incrime::config::DatabaseConfig;
use tempfile::TempDir;

use crate::support::{setup_test_app_with, test_auth_config};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumers_succeed_at_most_once() {
    let dir = TempDir::new().unwrap();
    let database = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("reset.db").display()),
        max_connections: 4,
        ..DatabaseConfig::default()
    };
    let app = setup_test_app_with(database, test_auth_config()).await;
    app.create_account("racer", "racer@example.pk", Role::User).await;

    app.state.resets.request_reset("racer@example.pk").await.unwrap();
    let raw = Arc::new(app.delivery.last_token_for("racer@example.pk").unwrap());

    let mut handles = Vec::new();
    for i in 0..4 {
        let resets = app.state.resets.clone();
        let raw = raw.clone();
        handles.push(tokio::spawn(async move {
            resets.consume_reset(&raw, &format!("racing-password-{i}")).await.is_ok()
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
}
