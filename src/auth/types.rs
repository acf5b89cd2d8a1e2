//! Auth types
//!
//! The authentication mode is chosen once per client: a static API key, a
//! session token obtained by logging in, or nothing yet.

use crate::error::{Error, Result};
use crate::types::User;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Header carrying a static API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header carrying a session token
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Lifetime the server grants a session
pub const SESSION_TTL_HOURS: i64 = 24;

static API_KEY_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^mps_[0-9a-f]{32}$").expect("valid API key regex"));

/// Check whether a key has the `mps_<32 hex>` shape the server issues
pub fn is_well_formed_api_key(key: &str) -> bool {
    API_KEY_FORMAT.is_match(key)
}

/// How requests are authenticated
#[derive(Clone, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Static API key sent as `x-api-key`
    ApiKey(String),
    /// Session token sent as `x-session-token`
    SessionToken(String),
    /// No credentials yet
    #[default]
    Unauthenticated,
}

impl AuthMode {
    /// Header name and value for this mode
    pub fn header(&self) -> Result<(&'static str, &str)> {
        match self {
            AuthMode::ApiKey(key) => Ok((API_KEY_HEADER, key.as_str())),
            AuthMode::SessionToken(token) => Ok((SESSION_TOKEN_HEADER, token.as_str())),
            AuthMode::Unauthenticated => Err(Error::NotAuthenticated),
        }
    }

    /// Whether requests can be authenticated
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, AuthMode::Unauthenticated)
    }

    /// Whether an API key is in use
    pub fn is_api_key(&self) -> bool {
        matches!(self, AuthMode::ApiKey(_))
    }

    /// Short name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthMode::ApiKey(_) => "api_key",
            AuthMode::SessionToken(_) => "session",
            AuthMode::Unauthenticated => "none",
        }
    }
}

impl std::fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::ApiKey(_) => f.write_str("ApiKey(***)"),
            AuthMode::SessionToken(_) => f.write_str("SessionToken(***)"),
            AuthMode::Unauthenticated => f.write_str("Unauthenticated"),
        }
    }
}

/// A logged-in session
#[derive(Clone)]
pub struct Session {
    /// Session token
    pub token: String,
    /// User the session belongs to
    pub user: User,
    /// When the login happened
    pub logged_in_at: DateTime<Utc>,
    /// When the server will drop the session
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session starting now with the server's default lifetime
    pub fn new(token: String, user: User) -> Self {
        let now = Utc::now();
        Self {
            token,
            user,
            logged_in_at: now,
            expires_at: now + Duration::hours(SESSION_TTL_HOURS),
        }
    }

    /// Check if the session is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(30) >= self.expires_at
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("logged_in_at", &self.logged_in_at)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Result of a login call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// An API key is configured; no login was attempted
    ApiKeyInUse,
    /// Logged in as this user
    LoggedIn(User),
}

/// Body of `POST /api/login`
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Body of `GET /api/auth/me`
#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    pub user: User,
}
