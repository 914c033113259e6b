#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc,
    unreachable_pub,
    missing_debug_implementations
)]
use common::{EMAIL, PASSWORD, TestApp};
use reqwest::StatusCode;
use serde_json::json;

mod common;

async fn access_token(app: &TestApp) -> String {
    app.register(EMAIL, PASSWORD).await;
    let session: serde_json::Value = app.login(EMAIL, PASSWORD, app.app_id).await.json().await.unwrap();
    session["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = TestApp::spawn().await;
    let url = format!("{}/v1/users/me", app.server_url);

    let resp = app.client.get(&url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.client.get(&url).header("Authorization", "Token abc").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.client.get(&url).bearer_auth("not-a-token").send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_get_and_update_profile() {
    let app = TestApp::spawn().await;
    let token = access_token(&app).await;
    let url = format!("{}/v1/users/me", app.server_url);

    let me: serde_json::Value = app.client.get(&url).bearer_auth(&token).send().await.unwrap().json().await.unwrap();
    assert_eq!(me["email"], EMAIL);
    assert_eq!(me["profile"]["steamUrl"], "");

    let resp = app
        .client
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({ "profile": { "steamUrl": "https://steamcommunity.com/id/me", "photoPath": "/me.png" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(updated["profile"]["photoPath"], "/me.png");
    assert_eq!(updated["email"], EMAIL);
}

#[tokio::test]
async fn test_email_change_conflict() {
    let app = TestApp::spawn().await;
    app.register("taken@example.com", PASSWORD).await;
    let token = access_token(&app).await;

    let resp = app
        .client
        .patch(format!("{}/v1/users/me", app.server_url))
        .bearer_auth(&token)
        .json(&json!({ "email": "taken@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_delete_account() {
    let app = TestApp::spawn().await;
    let token = access_token(&app).await;
    let url = format!("{}/v1/users/me", app.server_url);

    let resp = app.client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(app.refresh_tokens.is_empty());

    let resp = app.client.get(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    assert_eq!(app.login(EMAIL, PASSWORD, app.app_id).await.status(), StatusCode::UNAUTHORIZED);
}
