//! Integration tests for recovery, verification, profile, and deactivation.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

const PASSWORD: &str = "correct-horse-battery";
const NEW_PASSWORD: &str = "quiet-meadow-tractor-19";

#[tokio::test]
async fn test_forgot_password_answers_the_same_for_unknown_addresses() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;

    let known = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            Some(json!({ "email": "alice@example.com" })),
            None,
        )
        .await;
    let unknown = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            Some(json!({ "email": "nobody@example.com" })),
            None,
        )
        .await;

    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(known.body, unknown.body);

    let sent = app.sent_mail(1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, "password_reset");
    assert_eq!(sent[0].to, "alice@example.com");
    assert!(sent[0].link.starts_with("http://app.test/reset-password?token="));
}

#[tokio::test]
async fn test_reset_password_flow() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let session = app.login("alice", PASSWORD).await;

    app.request(
        "POST",
        "/api/auth/forgot-password",
        Some(json!({ "email": "alice@example.com" })),
        None,
    )
    .await;
    let sent = app.sent_mail(1).await;
    let token = helpers::link_token(&sent[0].link);

    // Let the reset land in a later second than the link was issued.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let response = app
        .request(
            "PATCH",
            "/api/auth/reset-password",
            Some(json!({ "token": token, "new_password": NEW_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);

    let response = app
        .request("GET", "/api/auth/me", None, Some(&session))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    app.login("alice", NEW_PASSWORD).await;

    // The link is single-use.
    let response = app
        .request(
            "PATCH",
            "/api/auth/reset-password",
            Some(json!({ "token": token, "new_password": "another-fresh-passphrase" })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_reset_rejects_garbage_token() {
    let app = helpers::TestApp::new().await;

    let response = app
        .request(
            "PATCH",
            "/api/auth/reset-password",
            Some(json!({ "token": "not-a-link", "new_password": NEW_PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_email_verification_flow() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let session = app.login("alice", PASSWORD).await;

    let response = app
        .request("POST", "/api/auth/account-verification", None, Some(&session))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Verification link has been sent");

    let sent = app.sent_mail(1).await;
    assert_eq!(sent[0].kind, "account_confirmation");
    assert!(sent[0].link.starts_with("http://app.test/account-verification?token="));
    let token = helpers::link_token(&sent[0].link);

    // A verification link is not a reset link.
    let response = app
        .request(
            "PATCH",
            "/api/auth/reset-password",
            Some(json!({ "token": token, "new_password": NEW_PASSWORD })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "PATCH",
            "/api/auth/account-confirmation",
            Some(json!({ "token": token })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Email verified");

    let response = app
        .request(
            "PATCH",
            "/api/auth/account-confirmation",
            Some(json!({ "token": token })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Email is already verified");

    let me = app.request("GET", "/api/auth/me", None, Some(&session)).await;
    assert_eq!(me.body["data"]["email_verified"], true);

    let response = app
        .request("POST", "/api/auth/account-verification", None, Some(&session))
        .await;
    assert_eq!(response.body["message"], "Email is already verified");
}

#[tokio::test]
async fn test_link_token_is_not_an_access_token() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;

    app.request(
        "POST",
        "/api/auth/forgot-password",
        Some(json!({ "email": "alice@example.com" })),
        None,
    )
    .await;
    let sent = app.sent_mail(1).await;
    let token = helpers::link_token(&sent[0].link);

    let response = app.request("GET", "/api/auth/me", None, Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_profile() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let session = app.login("alice", PASSWORD).await;

    let response = app
        .request(
            "PATCH",
            "/api/auth/update-profile",
            Some(json!({ "first_name": "Alice", "phone_number": "+15550100" })),
            Some(&session),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["first_name"], "Alice");
    assert_eq!(response.body["data"]["phone_number"], "+15550100");
    assert!(response.body["data"]["last_name"].is_null());
}

#[tokio::test]
async fn test_deactivate_account() {
    let app = helpers::TestApp::new().await;
    app.create_test_user("alice", PASSWORD).await;
    let session = app.login("alice", PASSWORD).await;

    let response = app
        .request("PATCH", "/api/auth/deactivate-account", None, Some(&session))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Account deactivated");

    let response = app.request("GET", "/api/auth/me", None, Some(&session)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.login_response("alice", PASSWORD).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["status"], "INVALID_CREDENTIALS");
}
