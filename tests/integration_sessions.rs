#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc,
    unreachable_pub,
    missing_debug_implementations
)]
use common::{EMAIL, PASSWORD, TestServices};
use std::sync::Arc;
use std::time::Duration;
use tenant_sso::adapters::memory::InMemoryRefreshTokenStore;
use tenant_sso::adapters::{CredentialStore, RefreshTokenStore};
use tenant_sso::error::AppError;
use tenant_sso::services::opaque_token::OpaqueToken;

mod common;

#[tokio::test]
async fn test_login_issues_scoped_token_pair() {
    let test = TestServices::new().await;
    let user_id = test.register_default_user().await;
    assert_eq!(test.app_id, 1);

    let session = test.services.session_manager.login(EMAIL, PASSWORD, 1).await.unwrap();

    let validation = test.services.session_manager.validate_token(&session.access_token).await.unwrap();
    assert!(validation.valid);
    assert_eq!(validation.user_id, Some(user_id));

    let claims = validation.claims.unwrap();
    assert_eq!(claims.uid, user_id);
    assert_eq!(claims.email, EMAIL);
    assert_eq!(claims.app_id, 1);
    assert!(!claims.is_admin);
    assert_eq!(claims.token_type, "access");

    // 32 random bytes, URL-safe base64 without padding.
    assert_eq!(session.refresh_token.len(), 43);
    assert!(session.refresh_token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    assert_eq!(test.refresh_tokens.len(), 1);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let test = TestServices::new().await;
    test.register_default_user().await;
    let manager = &test.services.session_manager;

    let wrong_password = manager.login(EMAIL, "wrong-password", 1).await.unwrap_err();
    let unknown_email = manager.login("nobody@example.com", PASSWORD, 1).await.unwrap_err();
    let unknown_app = manager.login(EMAIL, PASSWORD, 42).await.unwrap_err();

    for err in [&wrong_password, &unknown_email, &unknown_app] {
        assert!(matches!(err, AppError::InvalidCredentials));
    }
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert_eq!(unknown_email.to_string(), unknown_app.to_string());
    assert!(test.refresh_tokens.is_empty());
}

#[tokio::test]
async fn test_refresh_rotates_and_old_token_is_single_use() {
    let test = TestServices::new().await;
    test.register_default_user().await;
    let manager = &test.services.session_manager;

    let first = manager.login(EMAIL, PASSWORD, 1).await.unwrap();
    let second = manager.refresh(&first.refresh_token).await.unwrap();

    assert_ne!(first.refresh_token, second.refresh_token);
    assert!(manager.validate_token(&second.access_token).await.unwrap().valid);

    assert!(matches!(manager.refresh(&first.refresh_token).await, Err(AppError::InvalidCredentials)));
    assert!(test.refresh_tokens.find(&OpaqueToken::hash(&first.refresh_token)).await.unwrap().is_none());

    manager.refresh(&second.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_refresh_picks_up_admin_change() {
    let test = TestServices::new().await;
    let user_id = test.register_default_user().await;
    let manager = &test.services.session_manager;

    let session = manager.login(EMAIL, PASSWORD, 1).await.unwrap();
    test.services.app_service.grant_admin(user_id, 1).await.unwrap();
    assert!(manager.is_admin(user_id, 1).await.unwrap());

    let refreshed = manager.refresh(&session.refresh_token).await.unwrap();
    let claims = manager.validate_token(&refreshed.access_token).await.unwrap().claims.unwrap();
    assert!(claims.is_admin);
}

#[tokio::test]
async fn test_concurrent_refresh_has_exactly_one_winner() {
    let test = TestServices::new().await;
    test.register_default_user().await;
    let session = test.services.session_manager.login(EMAIL, PASSWORD, 1).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = test.services.session_manager.clone();
        let token = session.refresh_token.clone();
        handles.push(tokio::spawn(async move { manager.refresh(&token).await }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert!(matches!(e, AppError::InvalidCredentials), "unexpected error: {e}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(test.refresh_tokens.len(), 1, "losers must not leave tokens behind");
}

#[tokio::test]
async fn test_logout_revokes_and_is_idempotent() {
    let test = TestServices::new().await;
    test.register_default_user().await;
    let manager = &test.services.session_manager;

    let session = manager.login(EMAIL, PASSWORD, 1).await.unwrap();
    assert!(manager.logout(&session.refresh_token).await.unwrap());
    assert!(!manager.logout(&session.refresh_token).await.unwrap());
    assert!(matches!(manager.refresh(&session.refresh_token).await, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_tokens_do_not_cross_apps() {
    let test = TestServices::new().await;
    test.register_default_user().await;
    let other = test.services.app_service.create_app("other", "", None).await.unwrap();
    let manager = &test.services.session_manager;

    let a = manager.login(EMAIL, PASSWORD, 1).await.unwrap();
    let b = manager.login(EMAIL, PASSWORD, other.id).await.unwrap();

    let claims_a = manager.validate_token(&a.access_token).await.unwrap().claims.unwrap();
    let claims_b = manager.validate_token(&b.access_token).await.unwrap().claims.unwrap();
    assert_eq!(claims_a.app_id, 1);
    assert_eq!(claims_b.app_id, other.id);

    // One live refresh token per (user, app), independent across apps.
    assert_eq!(test.refresh_tokens.len(), 2);

    // A token signed with app 1's secret but claiming app 2 fails the signature check.
    let forged = tenant_sso::services::token_signer::TokenSigner::new()
        .issue(
            &tenant_sso::services::token_signer::TokenSubject {
                user_id: claims_a.uid,
                email: EMAIL,
                app_id: other.id,
                is_admin: true,
            },
            &test.credentials.find_app_by_id(1).await.unwrap().unwrap().secret,
            Duration::from_secs(60),
        )
        .unwrap();
    assert!(!manager.validate_token(&forged.token).await.unwrap().valid);
}

#[tokio::test]
async fn test_expired_access_token_is_invalid_not_error() {
    let mut config = common::get_test_config();
    config.auth.access_token_ttl_secs = 0;
    let test = TestServices::with_config(config).await;
    test.register_default_user().await;

    let session = test.services.session_manager.login(EMAIL, PASSWORD, 1).await.unwrap();
    let validation = test.services.session_manager.validate_token(&session.access_token).await.unwrap();

    assert!(!validation.valid);
    assert!(validation.user_id.is_none());
    assert!(validation.claims.is_none());
}

#[tokio::test]
async fn test_duplicate_registration_is_user_exists() {
    let test = TestServices::new().await;
    test.register_default_user().await;

    let result = test.services.session_manager.register_new_user(EMAIL, "other-password", Default::default()).await;
    assert!(matches!(result, Err(AppError::UserExists)));
}

#[tokio::test]
async fn test_password_change_ends_sessions() {
    let test = TestServices::new().await;
    let user_id = test.register_default_user().await;
    let manager = &test.services.session_manager;

    let session = manager.login(EMAIL, PASSWORD, 1).await.unwrap();
    test.services
        .user_service
        .update_user(
            user_id,
            tenant_sso::services::user_service::ProfileChange {
                password: Some("a-new-password".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(matches!(manager.refresh(&session.refresh_token).await, Err(AppError::InvalidCredentials)));
    assert!(matches!(manager.login(EMAIL, PASSWORD, 1).await, Err(AppError::InvalidCredentials)));
    manager.login(EMAIL, "a-new-password", 1).await.unwrap();
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let mut config = common::get_test_config();
    config.auth.store_timeout_ms = 50;

    let app = tenant_sso::AppBuilder::new(config)
        .with_stores(
            Arc::new(common::SlowCredentialStore::new(Duration::from_secs(5))) as Arc<dyn CredentialStore>,
            Arc::new(InMemoryRefreshTokenStore::new()) as Arc<dyn RefreshTokenStore>,
        )
        .build()
        .unwrap();

    let started = std::time::Instant::now();
    let result = app.services.session_manager.login(EMAIL, PASSWORD, 1).await;

    assert!(matches!(result, Err(AppError::Timeout)));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(app.services.health_service.check_store().await.is_err());
}
