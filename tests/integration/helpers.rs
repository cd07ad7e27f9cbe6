//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt;

use tokengate_api::{AppState, Backends, build_app, build_state};
use tokengate_cache::CacheManager;
use tokengate_core::config::AppConfig;
use tokengate_core::result::AppResult;
use tokengate_core::traits::Mailer;
use tokengate_database::memory::{MemoryRefreshTokenRepository, MemoryUserRepository};

/// A message the application tried to send.
#[derive(Debug, Clone)]
pub struct SentMail {
    /// `password_reset` or `account_confirmation`.
    pub kind: &'static str,
    /// Recipient.
    pub to: String,
    /// The link in the message.
    pub link: String,
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Clone, Default)]
pub struct CapturingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send_password_reset_email(&self, email: &str, reset_link: &str) -> AppResult<()> {
        self.sent.lock().await.push(SentMail {
            kind: "password_reset",
            to: email.to_string(),
            link: reset_link.to_string(),
        });
        Ok(())
    }

    async fn send_account_confirmation_email(
        &self,
        email: &str,
        verify_link: &str,
    ) -> AppResult<()> {
        self.sent.lock().await.push(SentMail {
            kind: "account_confirmation",
            to: email.to_string(),
            link: verify_link.to_string(),
        });
        Ok(())
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching components directly
    pub state: AppState,
    /// Refresh token rows
    pub refresh_rows: MemoryRefreshTokenRepository,
    /// Outgoing mail
    pub mailer: CapturingMailer,
}

impl TestApp {
    /// Create a new test application on in-memory backends.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application after adjusting the test configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default();
        config.database.url = "memory".to_string();
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.auth.password_min_score = 0;
        config.auth.argon2_memory_kib = 64;
        config.auth.argon2_iterations = 1;
        config.rate_limit.enabled = false;
        config.mail.base_url = "http://app.test".to_string();
        adjust(&mut config);

        let cache = Arc::new(
            CacheManager::new(&config.cache)
                .await
                .expect("Failed to init cache"),
        );
        let users = MemoryUserRepository::new();
        let refresh_rows = MemoryRefreshTokenRepository::new();
        let mailer = CapturingMailer::default();

        let state = build_state(
            config,
            Backends {
                user_repo: Arc::new(users),
                refresh_repo: Arc::new(refresh_rows.clone()),
                cache,
                mailer: Arc::new(mailer.clone()),
                db_pool: None,
            },
        )
        .expect("Failed to build state");

        Self {
            router: build_app(state.clone()),
            state,
            refresh_rows,
            mailer,
        }
    }

    /// Register an account through the API.
    pub async fn register(&self, username: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/register",
            Some(json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": password,
            })),
            None,
        )
        .await
    }

    /// Register an account and fail the test if that is refused.
    pub async fn create_test_user(&self, username: &str, password: &str) -> String {
        let response = self.register(username, password).await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "register failed: {}",
            response.body
        );
        response.body["data"]["id"]
            .as_str()
            .expect("No user id")
            .to_string()
    }

    /// Log in and return the full response.
    pub async fn login_response(&self, username: &str, password: &str) -> TestResponse {
        self.request(
            "POST",
            "/api/auth/login",
            Some(json!({ "username": username, "password": password })),
            None,
        )
        .await
    }

    /// Log in and return the access token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self.login_response(username, password).await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["data"]["access_token"]
            .as_str()
            .expect("No access token in response")
            .to_string()
    }

    /// Wait for background mail dispatch and return what was sent.
    pub async fn sent_mail(&self, expected: usize) -> Vec<SentMail> {
        for _ in 0..100 {
            let sent = self.mailer.sent.lock().await.clone();
            if sent.len() >= expected {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.mailer.sent.lock().await.clone()
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_with_headers(method, path, body, token, &[])
            .await
    }

    /// Make an HTTP request with extra headers
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        self.send(req).await
    }

    /// Send a request as if it arrived over a connection from `peer`.
    pub async fn request_from_peer(
        &self,
        peer: &str,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let mut req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");
        let addr: SocketAddr = peer.parse().expect("Invalid peer address");
        req.extensions_mut().insert(ConnectInfo(addr));

        self.send(req).await
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let www_authenticate = response
            .headers()
            .get("www-authenticate")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            www_authenticate,
        }
    }
}

/// Token carried in an emailed link.
pub fn link_token(link: &str) -> String {
    link.split("token=")
        .nth(1)
        .expect("Link has no token")
        .to_string()
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
    /// `WWW-Authenticate` header, if any
    pub www_authenticate: Option<String>,
}
