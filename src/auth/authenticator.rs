//! Authenticator implementation
//!
//! Holds the current auth mode, applies it to requests, and runs the
//! session login/logout handshake.

use super::types::{
    is_well_formed_api_key, AuthMode, LoginOutcome, LoginResponse, Session, SESSION_TOKEN_HEADER,
};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use reqwest::{Method, RequestBuilder};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct AuthState {
    mode: AuthMode,
    session: Option<Session>,
}

/// Authenticator handles applying authentication to HTTP requests
#[derive(Clone)]
pub struct Authenticator {
    /// Current mode and session
    state: Arc<RwLock<AuthState>>,
}

impl Authenticator {
    /// Create a new authenticator with the given mode
    pub fn new(mode: AuthMode) -> Self {
        if let AuthMode::ApiKey(key) = &mode {
            if !is_well_formed_api_key(key) {
                warn!("API key does not look like mps_<32 hex chars>, using it anyway");
            }
        }

        Self {
            state: Arc::new(RwLock::new(AuthState {
                mode,
                session: None,
            })),
        }
    }

    /// Current auth mode
    pub async fn mode(&self) -> AuthMode {
        self.state.read().await.mode.clone()
    }

    /// Current session, if logged in
    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    /// Fail unless requests can be authenticated right now
    pub async fn ensure_authenticated(&self) -> Result<()> {
        let state = self.state.read().await;
        Self::check(&state)?;
        Ok(())
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        let state = self.state.read().await;
        Self::check(&state)?;
        let (name, value) = state.mode.header()?;
        Ok(req.header(name, value))
    }

    fn check(state: &AuthState) -> Result<()> {
        if let Some(session) = &state.session {
            if session.is_expired() {
                return Err(Error::SessionExpired {
                    username: session.user.username.clone(),
                });
            }
        }
        state.mode.header().map(|_| ())
    }

    /// Adopt `session` and switch to session-token mode
    pub async fn install_session(&self, session: Session) {
        let mut state = self.state.write().await;
        state.mode = AuthMode::SessionToken(session.token.clone());
        state.session = Some(session);
    }

    /// Log in through `http` and switch to session-token mode.
    ///
    /// With an API key configured this is a no-op.
    pub async fn login(
        &self,
        http: &HttpClient,
        login_path: &str,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome> {
        if self.state.read().await.mode.is_api_key() {
            warn!("Using API key, login not required");
            return Ok(LoginOutcome::ApiKeyInUse);
        }

        if username.is_empty() || password.is_empty() {
            return Err(Error::auth("Username and password are required"));
        }

        let request = RequestConfig::new()
            .json(json!({ "username": username, "password": password }))
            .anonymous();
        let body: LoginResponse = http
            .request_json(Method::POST, login_path, request)
            .await
            .map_err(|e| match e {
                Error::HttpStatus { status, message } => {
                    Error::auth(format!("Login failed with status {status}: {message}"))
                }
                Error::JsonParse(e) => Error::auth(format!("Unexpected login response: {e}")),
                other => other,
            })?;

        let user = body.user.clone();
        self.install_session(Session::new(body.token, body.user)).await;

        info!(username = %user.username, role = %user.role, "Logged in");
        Ok(LoginOutcome::LoggedIn(user))
    }

    /// Log out of the current session through `http`.
    ///
    /// No-op with an API key or without a session.
    pub async fn logout(&self, http: &HttpClient, logout_path: &str) -> Result<()> {
        let token = match &self.state.read().await.mode {
            AuthMode::SessionToken(token) => token.clone(),
            other => {
                debug!(mode = other.kind(), "No session to log out of");
                return Ok(());
            }
        };

        let request = RequestConfig::new()
            .header(SESSION_TOKEN_HEADER, token)
            .anonymous();
        http.request(Method::POST, logout_path, request).await?;

        self.clear().await;
        info!("Logged out");
        Ok(())
    }

    /// Drop the session and return to unauthenticated mode
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        if !state.mode.is_api_key() {
            state.mode = AuthMode::Unauthenticated;
        }
        state.session = None;
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}
