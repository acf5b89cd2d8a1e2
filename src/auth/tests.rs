//! Tests for the auth module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::types::User;
use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "mps_0123456789abcdef0123456789abcdef";

fn http_for(server: &MockServer) -> HttpClient {
    HttpClient::with_config(HttpClientConfig::builder().base_url(server.uri()).build()).unwrap()
}

fn offline_http() -> HttpClient {
    HttpClient::with_config(HttpClientConfig::builder().base_url("http://127.0.0.1:9").build())
        .unwrap()
}

fn expired_session(token: &str) -> Session {
    let mut session = Session::new(
        token.to_string(),
        User {
            username: "production".to_string(),
            role: "production".to_string(),
        },
    );
    session.logged_in_at = Utc::now() - Duration::hours(25);
    session.expires_at = Utc::now() - Duration::hours(1);
    session
}

#[test]
fn test_header_per_mode() {
    let mode = AuthMode::ApiKey(KEY.to_string());
    assert_eq!(mode.header().unwrap(), ("x-api-key", KEY));

    let mode = AuthMode::SessionToken("tok".to_string());
    assert_eq!(mode.header().unwrap(), ("x-session-token", "tok"));

    let err = AuthMode::Unauthenticated.header().unwrap_err();
    assert!(matches!(err, Error::NotAuthenticated));
}

#[tokio::test]
async fn test_unauthenticated_apply_fails() {
    let auth = Authenticator::new(AuthMode::Unauthenticated);
    let client = reqwest::Client::new();
    let req = client.get("https://example.com/api");

    let result = auth.apply(req).await;
    assert!(matches!(result, Err(Error::NotAuthenticated)));
}

#[tokio::test]
async fn test_api_key_header() {
    let auth = Authenticator::new(AuthMode::ApiKey(KEY.to_string()));

    let client = reqwest::Client::new();
    let req = client.get("https://example.com/api");
    let req = auth.apply(req).await.unwrap();

    // Build the request to inspect headers
    let built = req.build().unwrap();
    assert_eq!(built.headers().get("x-api-key").unwrap(), KEY);
    assert!(built.headers().get("x-session-token").is_none());
}

#[tokio::test]
async fn test_session_token_header() {
    let auth = Authenticator::new(AuthMode::SessionToken("abc123".to_string()));

    let client = reqwest::Client::new();
    let req = client.get("https://example.com/api");
    let req = auth.apply(req).await.unwrap();

    let built = req.build().unwrap();
    assert_eq!(built.headers().get("x-session-token").unwrap(), "abc123");
    assert!(built.headers().get("x-api-key").is_none());
}

#[tokio::test]
async fn test_login_switches_to_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({"username": "production", "password": "password123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "token": "session-token-xyz",
            "user": {"username": "production", "role": "production"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthMode::Unauthenticated);
    let outcome = auth
        .login(&http_for(&mock_server), "/api/login", "production", "password123")
        .await
        .unwrap();

    assert_eq!(
        outcome,
        LoginOutcome::LoggedIn(User {
            username: "production".to_string(),
            role: "production".to_string(),
        })
    );
    assert_eq!(
        auth.mode().await,
        AuthMode::SessionToken("session-token-xyz".to_string())
    );
    assert!(auth.session().await.is_some());

    let client = reqwest::Client::new();
    let built = auth
        .apply(client.get("https://example.com/api"))
        .await
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(
        built.headers().get("x-session-token").unwrap(),
        "session-token-xyz"
    );
}

#[tokio::test]
async fn test_login_with_api_key_is_noop() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthMode::ApiKey(KEY.to_string()));
    let outcome = auth
        .login(&http_for(&mock_server), "/api/login", "u", "p")
        .await
        .unwrap();

    assert_eq!(outcome, LoginOutcome::ApiKeyInUse);
    assert!(auth.mode().await.is_api_key());
}

#[tokio::test]
async fn test_login_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": "Invalid username or password"})),
        )
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthMode::Unauthenticated);
    let err = auth
        .login(&http_for(&mock_server), "/api/login", "u", "wrong")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth { .. }));
    let text = err.to_string();
    assert!(text.contains("401"));
    assert!(text.contains("Invalid username or password"));
    assert_eq!(auth.mode().await, AuthMode::Unauthenticated);
}

#[tokio::test]
async fn test_login_requires_credentials() {
    let auth = Authenticator::new(AuthMode::Unauthenticated);
    let err = auth
        .login(&offline_http(), "/api/login", "", "secret")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_logout_clears_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .and(header("x-session-token", "tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthMode::SessionToken("tok".to_string()));
    auth.logout(&http_for(&mock_server), "/api/logout")
        .await
        .unwrap();

    assert_eq!(auth.mode().await, AuthMode::Unauthenticated);
}

#[tokio::test]
async fn test_logout_with_api_key_is_noop() {
    let auth = Authenticator::new(AuthMode::ApiKey(KEY.to_string()));
    auth.logout(&offline_http(), "/api/logout").await.unwrap();
    assert!(auth.mode().await.is_api_key());
}

#[tokio::test]
async fn test_clear_keeps_api_key() {
    let auth = Authenticator::new(AuthMode::ApiKey(KEY.to_string()));
    auth.clear().await;
    assert!(auth.mode().await.is_api_key());

    let auth = Authenticator::new(AuthMode::SessionToken("tok".to_string()));
    auth.clear().await;
    assert!(!auth.mode().await.is_authenticated());
}

#[tokio::test]
async fn test_login_with_unexpected_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthMode::Unauthenticated);
    let err = auth
        .login(&http_for(&mock_server), "/api/login", "u", "p")
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Unexpected login response"));
    assert!(auth.session().await.is_none());
}

#[tokio::test]
async fn test_logout_failure_keeps_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "SQLITE_BUSY"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth = Authenticator::new(AuthMode::SessionToken("tok".to_string()));
    let err = auth
        .logout(&http_for(&mock_server), "/api/logout")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(auth.mode().await, AuthMode::SessionToken("tok".to_string()));
}

// ============================================================================
// Session Expiry Tests
// ============================================================================

#[tokio::test]
async fn test_expired_session_refuses_to_apply() {
    let auth = Authenticator::new(AuthMode::Unauthenticated);
    auth.install_session(expired_session("stale")).await;
    assert_eq!(auth.mode().await, AuthMode::SessionToken("stale".to_string()));

    let client = reqwest::Client::new();
    let err = auth
        .apply(client.get("https://example.com/api"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionExpired { ref username } if username == "production"));

    let err = auth.ensure_authenticated().await.unwrap_err();
    assert!(matches!(err, Error::SessionExpired { .. }));
}

#[tokio::test]
async fn test_expired_session_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let http = HttpClient::with_auth(
        HttpClientConfig::builder().base_url(mock_server.uri()).build(),
        AuthMode::Unauthenticated,
    )
    .unwrap();
    http.authenticator()
        .unwrap()
        .install_session(expired_session("stale"))
        .await;

    let err = http
        .get_json::<serde_json::Value>("/api/data/recent-mo")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SessionExpired { .. }));
}

#[tokio::test]
async fn test_fresh_session_applies_token() {
    let auth = Authenticator::new(AuthMode::Unauthenticated);
    auth.install_session(Session::new(
        "fresh".to_string(),
        User {
            username: "production".to_string(),
            role: "production".to_string(),
        },
    ))
    .await;

    auth.ensure_authenticated().await.unwrap();
    let built = auth
        .apply(reqwest::Client::new().get("https://example.com/api"))
        .await
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(built.headers().get("x-session-token").unwrap(), "fresh");
}
