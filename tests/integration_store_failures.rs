#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc,
    unreachable_pub,
    missing_debug_implementations
)]
use common::{EMAIL, FailingRefreshTokenStore, PASSWORD};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tenant_sso::ServiceContainer;
use tenant_sso::adapters::RefreshTokenStore;
use tenant_sso::domain::refresh_token::NewRefreshToken;
use tenant_sso::error::AppError;
use tenant_sso::services::opaque_token::OpaqueToken;
use tenant_sso::workers::RefreshTokenSweeper;
use time::OffsetDateTime;
use tokio::sync::watch;

mod common;

async fn setup() -> (ServiceContainer, Arc<FailingRefreshTokenStore>, String) {
    let store = Arc::new(FailingRefreshTokenStore::new());
    let (services, _, app_id) =
        common::build_services(common::get_test_config(), Arc::clone(&store) as Arc<dyn RefreshTokenStore>).await;

    services.session_manager.register_new_user(EMAIL, PASSWORD, Default::default()).await.unwrap();
    let session = services.session_manager.login(EMAIL, PASSWORD, app_id).await.unwrap();
    (services, store, session.refresh_token)
}

#[tokio::test]
async fn test_failed_create_leaves_old_refresh_token_usable() {
    let (services, store, refresh_token) = setup().await;
    let manager = &services.session_manager;

    store.fail_create.store(true, Ordering::SeqCst);
    assert!(matches!(manager.refresh(&refresh_token).await, Err(AppError::Internal)));

    assert!(store.inner.find(&OpaqueToken::hash(&refresh_token)).await.unwrap().is_some());
    assert_eq!(store.inner.len(), 1);

    store.fail_create.store(false, Ordering::SeqCst);
    manager.refresh(&refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_failed_delete_of_rotated_token_still_succeeds() {
    let (services, store, refresh_token) = setup().await;
    let manager = &services.session_manager;

    store.fail_delete_by_token.store(true, Ordering::SeqCst);
    let rotated = manager.refresh(&refresh_token).await.unwrap();
    store.fail_delete_by_token.store(false, Ordering::SeqCst);

    assert_ne!(rotated.refresh_token, refresh_token);
    assert!(manager.validate_token(&rotated.access_token).await.unwrap().valid);
    // The stale token stays behind until expiry or its next use.
    assert_eq!(store.inner.len(), 2);

    manager.refresh(&rotated.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_sweeper_keeps_running_after_failed_sweep() {
    let store = Arc::new(FailingRefreshTokenStore::new());
    store
        .create(&NewRefreshToken {
            token_hash: "expired".into(),
            user_id: 1,
            app_id: 1,
            expires_at: OffsetDateTime::now_utc() - time::Duration::minutes(5),
        })
        .await
        .unwrap();
    store.fail_delete_expired.store(true, Ordering::SeqCst);

    let sweeper = RefreshTokenSweeper::new(
        Arc::clone(&store) as Arc<dyn RefreshTokenStore>,
        Duration::from_millis(20),
        Duration::from_secs(1),
    );
    let (tx, rx) = watch::channel(false);
    let handle = tokio::spawn(sweeper.run(rx));

    tokio::time::timeout(Duration::from_secs(2), async {
        while store.sweep_attempts.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(store.inner.len(), 1);

    store.fail_delete_expired.store(false, Ordering::SeqCst);
    tokio::time::timeout(Duration::from_secs(2), async {
        while !store.inner.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
}
