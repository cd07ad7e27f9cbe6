//! Integration tests for the login, logout, refresh, and password change
//! flows.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

const PASSWORD: &str = "correct-horse-battery";

#[tokio::test]
async fn test_register_returns_created_without_digest() {
    let app = helpers::TestApp::new().await;

    let response = app.register("alice", PASSWORD).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["ok"], true);
    assert_eq!(response.body["status"], "CREATED");
    assert_eq!(response.body["statusCode"], 201);
    assert_eq!(response.body["data"]["username"], "alice");
    assert!(response.body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_conflicts() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;

    let response = app.register("alice", PASSWORD).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["status"], "CONFLICT");
    assert_eq!(response.body["message"], "username and email already used");

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "username": "alice",
                "email": "other@example.com",
                "password": PASSWORD,
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "username already used");
}

#[tokio::test]
async fn test_register_rejects_invalid_body() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "username": "alice",
                "email": "not-an-email",
                "password": PASSWORD,
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["status"], "BAD_REQUEST");
    assert_eq!(response.body["message"], "Invalid email address");
}

#[tokio::test]
async fn test_login_success() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("testuser", PASSWORD).await;

    let response = app.login_response("testuser", PASSWORD).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "SUCCESS");
    let data = &response.body["data"];
    assert!(data["access_token"].is_string());
    assert!(data["refresh_token"].is_string());
    assert_eq!(data["token_type"], "bearer");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("testuser", PASSWORD).await;

    let wrong_password = app.login_response("testuser", "not-the-password").await;
    let unknown_user = app.login_response("nobody", PASSWORD).await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert_eq!(wrong_password.body["status"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_me_requires_bearer_token() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.www_authenticate.as_deref(), Some("Bearer"));

    let response = app
        .request("GET", "/api/auth/me", None, Some("garbage"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], "TOKEN_INVALID");
}

#[tokio::test]
async fn test_me_returns_principal() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let token = app.login("alice", PASSWORD).await;

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["username"], "alice");
    assert_eq!(response.body["data"]["email"], "alice@example.com");
    assert!(response.body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let token = app.login("alice", PASSWORD).await;

    let response = app
        .request("POST", "/api/auth/logout", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], "UNAUTHENTICATED");

    // A second logout with the same token is refused at the gate.
    let response = app
        .request("POST", "/api/auth/logout", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_all_revokes_every_session() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let first = app.login("alice", PASSWORD).await;
    let second = app.login("alice", PASSWORD).await;

    let response = app
        .request("POST", "/api/auth/logout-all", None, Some(&first))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["revoked"], 2);

    for token in [&first, &second] {
        let response = app.request("GET", "/api/auth/me", None, Some(token)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_refresh_rotates_the_pair() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let login = app.login_response("alice", PASSWORD).await;
    let refresh = login.body["data"]["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            "/api/auth/refresh-token",
            Some(json!({ "refresh_token": refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let new_access = response.body["data"]["access_token"].as_str().unwrap();
    let me = app
        .request("GET", "/api/auth/me", None, Some(new_access))
        .await;
    assert_eq!(me.status, StatusCode::OK);

    // The consumed refresh token cannot be exchanged again.
    let response = app
        .request(
            "POST",
            "/api/auth/refresh-token",
            Some(json!({ "refresh_token": refresh })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_access_token_cannot_be_used_to_refresh() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let access = app.login("alice", PASSWORD).await;

    let response = app
        .request(
            "POST",
            "/api/auth/refresh-token",
            Some(json!({ "refresh_token": access })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], "TOKEN_INVALID");
}

#[tokio::test]
async fn test_change_password_revokes_sessions() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let token = app.login("alice", PASSWORD).await;
    let other = app.login("alice", PASSWORD).await;

    let response = app
        .request(
            "PUT",
            "/api/auth/change-password",
            Some(json!({
                "old_password": PASSWORD,
                "new_password": "new-staple-lantern-42",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    for t in [&token, &other] {
        let response = app.request("GET", "/api/auth/me", None, Some(t)).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    let old = app.login_response("alice", PASSWORD).await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
    app.login("alice", "new-staple-lantern-42").await;
}

#[tokio::test]
async fn test_change_password_with_wrong_old_password() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let token = app.login("alice", PASSWORD).await;

    let response = app
        .request(
            "PUT",
            "/api/auth/change-password",
            Some(json!({
                "old_password": "wrong-password",
                "new_password": "new-staple-lantern-42",
            })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Nothing was revoked.
    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_on_login() {
    let app = helpers::TestApp::with_config(|c| {
        c.rate_limit.enabled = true;
        c.rate_limit.burst = 2;
        c.rate_limit.refill_per_second = 0.0;
    })
    .await;

    let body = json!({ "username": "nobody", "password": "whatever" });
    for i in 0..2 {
        let spoofed = format!("9.9.9.{i}");
        let response = app
            .request_from_peer(
                "203.0.113.9:50000",
                "POST",
                "/api/auth/login",
                Some(body.clone()),
                &[("x-forwarded-for", spoofed.as_str())],
            )
            .await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    // A fresh forwarded-for value does not buy a fresh bucket.
    let response = app
        .request_from_peer(
            "203.0.113.9:50001",
            "POST",
            "/api/auth/login",
            Some(body.clone()),
            &[("x-forwarded-for", "9.9.9.99")],
        )
        .await;
    assert_eq!(response.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.body["status"], "RATE_LIMITED");

    // Another client is unaffected.
    let response = app
        .request_from_peer("198.51.100.4:50000", "POST", "/api/auth/login", Some(body), &[])
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Health is not throttled.
    let response = app.request("GET", "/api/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit_behind_trusted_proxy() {
    let app = helpers::TestApp::with_config(|c| {
        c.rate_limit.enabled = true;
        c.rate_limit.burst = 1;
        c.rate_limit.refill_per_second = 0.0;
        c.rate_limit.trust_forwarded_for = true;
    })
    .await;

    let body = json!({ "username": "nobody", "password": "whatever" });
    let proxy = "10.0.0.2:443";
    let send = |client: &'static str| {
        let body = body.clone();
        let app = &app;
        async move {
            app.request_from_peer(
                proxy,
                "POST",
                "/api/auth/login",
                Some(body),
                &[("x-forwarded-for", client)],
            )
            .await
        }
    };

    assert_eq!(send("203.0.113.9").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(send("203.0.113.10").await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(send("203.0.113.9").await.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_health() {
    let app = helpers::TestApp::new().await;

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["database"], "memory");
    assert_eq!(response.body["data"]["cache"], "connected");
}
