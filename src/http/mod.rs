//! HTTP client module
//!
//! Provides the HTTP client used by the API layer.
//!
//! # Features
//!
//! - **Base URL joining**: relative paths resolve against one base URL
//! - **Authentication**: integration with the auth module
//! - **Error classification**: non-2xx responses surface the server's `error` message

mod client;

pub use client::{error_message, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
