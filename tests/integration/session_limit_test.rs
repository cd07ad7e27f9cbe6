//! Integration tests for the per-user cap on active refresh tokens.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

const PASSWORD: &str = "correct-horse-battery";

#[tokio::test]
async fn test_fourth_login_retires_the_oldest_refresh_token() {
    let app = helpers::TestApp::new().await;
    let user_id: Uuid = app.create_test_user("alice", PASSWORD).await.parse().unwrap();

    let mut refresh_tokens = Vec::new();
    for _ in 0..4 {
        let response = app.login_response("alice", PASSWORD).await;
        assert_eq!(response.status, StatusCode::OK);
        refresh_tokens.push(
            response.body["data"]["refresh_token"]
                .as_str()
                .unwrap()
                .to_string(),
        );
    }

    let rows = app.refresh_rows.all_for_user(user_id).await;
    assert_eq!(rows.len(), 4);
    let active: Vec<_> = rows.iter().filter(|r| r.is_active).collect();
    assert_eq!(active.len(), 3);
    assert!(active.iter().all(|r| r.token != refresh_tokens[0]));

    let response = app
        .request(
            "POST",
            "/api/auth/refresh-token",
            Some(json!({ "refresh_token": refresh_tokens[0] })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], "TOKEN_EXPIRED");

    let response = app
        .request(
            "POST",
            "/api/auth/refresh-token",
            Some(json!({ "refresh_token": refresh_tokens[3] })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_cap_follows_configuration() {
    let app = helpers::TestApp::with_config(|c| c.auth.max_active_refresh_tokens = 1).await;
    let user_id: Uuid = app.create_test_user("bob", PASSWORD).await.parse().unwrap();

    app.login("bob", PASSWORD).await;
    app.login("bob", PASSWORD).await;

    let rows = app.refresh_rows.all_for_user(user_id).await;
    assert_eq!(rows.iter().filter(|r| r.is_active).count(), 1);
}

#[tokio::test]
async fn test_logout_all_deactivates_refresh_tokens() {
    let app = helpers::TestApp::new().await;
    let user_id: Uuid = app.create_test_user("carol", PASSWORD).await.parse().unwrap();
    let token = app.login("carol", PASSWORD).await;
    app.login("carol", PASSWORD).await;

    let response = app
        .request("POST", "/api/auth/logout-all", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let rows = app.refresh_rows.all_for_user(user_id).await;
    assert!(rows.iter().all(|r| !r.is_active));
}
