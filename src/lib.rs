// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # MPS Client
//!
//! Client library and CLI for the Manufacturing Process System (MPS)
//! data-export REST API.
//!
//! ## Features
//!
//! - **Auth**: static API key (`x-api-key`) or session login (`x-session-token`)
//! - **Pagination**: offset walker that follows `pagination.has_more` to the end
//! - **Walk bounds**: optional page limit, deadline and cancellation
//! - **Typed endpoints**: per-endpoint filter validation and builders
//! - **Export**: JSON or JSON Lines files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mps_client::api::{Endpoint, MpsClient};
//! use mps_client::auth::AuthMode;
//! use mps_client::pagination::FilterSet;
//!
//! #[tokio::main]
//! async fn main() -> mps_client::Result<()> {
//!     let client = MpsClient::new("http://localhost:3000", AuthMode::Unauthenticated)?;
//!     client.login("production", "password123").await?;
//!
//!     let filters = FilterSet::new().with("ready", "true");
//!     let orders = client.fetch_all(Endpoint::RecentMo, &filters).await?;
//!     println!("{} ready orders", orders.len());
//!
//!     mps_client::output::export_records(&orders, "exports/recent_mo.json", None)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        MpsClient                         │
//! │  login()  logout()  me()  get_page()  fetch_all()        │
//! └──────────────────────────────────────────────────────────┘
//!                               │
//! ┌────────────┬────────────────┴──┬──────────────┬──────────┐
//! │    Auth    │       HTTP        │   Paginate   │  Output  │
//! ├────────────┼───────────────────┼──────────────┼──────────┤
//! │ API Key    │ Base URL          │ Offset walk  │ JSON     │
//! │ Session    │ Timeouts          │ Max pages    │ JSONL    │
//! │            │ Status errors     │ Deadline     │          │
//! │            │                   │ Cancel       │          │
//! └────────────┴───────────────────┴──────────────┴──────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// API key and session authentication
pub mod auth;

/// HTTP client
pub mod http;

/// Offset pagination walker
pub mod pagination;

/// Endpoints, filters and the API client
pub mod api;

/// JSON and JSON Lines export
pub mod output;

/// Client configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use api::{Endpoint, MpsClient};
pub use config::ClientConfig;
pub use pagination::{fetch_all, FilterSet, Page, PageFetcher, PaginatedFetcher, WalkOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
