//! Error types for the MPS client
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the MPS client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Request Input Errors
    // ============================================================================
    #[error("Unknown endpoint: {name}")]
    UnknownEndpoint { name: String },

    #[error("Invalid filter '{key}' for {endpoint}: {message}")]
    InvalidFilter {
        endpoint: String,
        key: String,
        message: String,
    },

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Not authenticated: call login() or configure an API key")]
    NotAuthenticated,

    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Session for '{username}' expired, login again")]
    SessionExpired { username: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ============================================================================
    // Protocol Errors
    // ============================================================================
    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Malformed page: {message}")]
    MalformedPage { message: String },

    // ============================================================================
    // Pagination Errors
    // ============================================================================
    #[error(
        "Page fetch at offset {offset} failed after {records_fetched} records \
         (last successful offset: {}): {source}",
        display_offset(.last_successful_offset)
    )]
    PageFetch {
        offset: u64,
        last_successful_offset: Option<u64>,
        records_fetched: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Page limit of {max_pages} reached with more pages remaining ({records_fetched} records fetched)")]
    PageLimitExceeded { max_pages: u32, records_fetched: usize },

    #[error(
        "Walk deadline of {deadline_ms}ms exceeded at offset {offset} after {records_fetched} records \
         (last successful offset: {})",
        display_offset(.last_successful_offset)
    )]
    DeadlineExceeded {
        deadline_ms: u64,
        offset: u64,
        last_successful_offset: Option<u64>,
        records_fetched: usize,
    },

    #[error("Pagination cancelled at offset {offset}")]
    Cancelled { offset: u64 },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {message}")]
    Output { message: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed page error
    pub fn malformed_page(message: impl Into<String>) -> Self {
        Self::MalformedPage {
            message: message.into(),
        }
    }

    /// Create an invalid filter error
    pub fn invalid_filter(
        endpoint: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidFilter {
            endpoint: endpoint.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output(message: impl Into<String>) -> Self {
        Self::Output {
            message: message.into(),
        }
    }

    /// Network-level failure: the request never produced a response
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Http(e) => !e.is_decode() && !e.is_status(),
            Error::Timeout { .. } => true,
            Error::PageFetch { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// The server answered, but not with a usable page
    pub fn is_protocol(&self) -> bool {
        match self {
            Error::HttpStatus { .. } | Error::MalformedPage { .. } | Error::JsonParse(_) => true,
            Error::Http(e) => e.is_decode() || e.is_status(),
            Error::PageFetch { source, .. } => source.is_protocol(),
            _ => false,
        }
    }

    /// HTTP status code, looking through page fetch wrappers
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::HttpStatus { status, .. } => Some(*status),
            Error::PageFetch { source, .. } => source.status(),
            _ => None,
        }
    }
}

fn display_offset(offset: &Option<u64>) -> String {
    offset.map_or_else(|| "none".to_string(), |o| o.to_string())
}

/// Result type alias for the MPS client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
