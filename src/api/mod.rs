//! MPS API module
//!
//! Endpoint catalogue, typed filters and the [`MpsClient`] that binds the
//! HTTP client, authentication and the pagination walker together.
//!
//! # Example
//!
//! ```no_run
//! use mps_client::api::{MpsClient, ProductionLogFilter, ProductionStatus};
//! use mps_client::auth::AuthMode;
//!
//! # async fn run() -> mps_client::Result<()> {
//! let client = MpsClient::new(
//!     "http://localhost:3000",
//!     AuthMode::ApiKey("mps_0123456789abcdef0123456789abcdef".into()),
//! )?;
//! let events = client
//!     .production_log(ProductionLogFilter::new().status(ProductionStatus::Start))
//!     .await?;
//! println!("{} start events", events.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod endpoints;
mod filters;

pub use client::{EndpointFetcher, MpsClient};
pub use endpoints::{Endpoint, FilterKind, FilterSpec};
pub use filters::{
    FilterDate, ManufacturingIdentityFilter, ProductionLogFilter, ProductionStatus,
    RecentMoFilter,
};
