//! Pagination types and traits
//!
//! Defines the page shape returned by the data endpoints, the filter set
//! forwarded to every request, and the capability trait the walker drives.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Page size used when the caller does not pick one
pub const DEFAULT_PAGE_SIZE: u32 = 100;

// ============================================================================
// Page
// ============================================================================

/// Pagination metadata attached to every page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Number of matching records on the server
    #[serde(default)]
    pub total: u64,
    /// Whether more pages exist beyond this one
    pub has_more: bool,
    /// Limit echoed back by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Offset echoed back by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

/// One bounded response from a list endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Records in server order
    pub data: Vec<Record>,
    /// Pagination metadata
    pub pagination: PageInfo,
}

impl Page {
    /// Create a page with the given records
    pub fn new(data: Vec<Record>, total: u64, has_more: bool) -> Self {
        Self {
            data,
            pagination: PageInfo {
                total,
                has_more,
                limit: None,
                offset: None,
            },
        }
    }

    /// Parse a page from a response body.
    ///
    /// `data` must be an array of objects and `pagination.has_more` must be
    /// a boolean; everything else is optional.
    pub fn from_value(body: JsonValue) -> Result<Self> {
        let Some(object) = body.as_object() else {
            return Err(Error::malformed_page("response body is not an object"));
        };

        match object.get("data") {
            Some(JsonValue::Array(_)) => {}
            Some(_) => return Err(Error::malformed_page("'data' is not an array")),
            None => return Err(Error::malformed_page("missing 'data'")),
        }

        match object.get("pagination").and_then(|p| p.get("has_more")) {
            Some(JsonValue::Bool(_)) => {}
            Some(_) => {
                return Err(Error::malformed_page(
                    "'pagination.has_more' is not a boolean",
                ))
            }
            None => return Err(Error::malformed_page("missing 'pagination.has_more'")),
        }

        serde_json::from_value(body).map_err(|e| Error::malformed_page(e.to_string()))
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the page carries no records
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether another page follows
    pub fn has_more(&self) -> bool {
        self.pagination.has_more
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Filter name to value mapping forwarded unchanged to every page request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet(BTreeMap<String, String>);

impl FilterSet {
    /// Create an empty filter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter, builder style
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add or replace a filter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Add a filter only when a value is present
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl Into<String>>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Parse a `key=value` pair, as given on the command line
    pub fn parse_pair(pair: &str) -> Result<(String, String)> {
        match pair.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(Error::config(format!(
                "Invalid filter '{pair}', expected key=value"
            ))),
        }
    }

    /// Get a filter value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Check if a filter is set
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of filters
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no filters are set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate filters in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ============================================================================
// Page Fetch Capability
// ============================================================================

/// Arguments of a single page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum records to return
    pub limit: u32,
    /// Records to skip
    pub offset: u64,
    /// Filters, identical for every page of a walk
    pub filters: FilterSet,
}

/// Performs one bounded request and returns a page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the page described by `request`
    async fn fetch_page(&self, request: PageRequest) -> Result<Page>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch_page(&self, request: PageRequest) -> Result<Page> {
        (**self).fetch_page(request).await
    }
}

/// Adapter turning an async closure into a [`PageFetcher`]
pub struct FnFetcher<F> {
    f: F,
}

/// Wrap a closure `Fn(PageRequest) -> Future<Output = Result<Page>>`
pub fn from_fn<F, Fut>(f: F) -> FnFetcher<F>
where
    F: Fn(PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Page>> + Send,
{
    FnFetcher { f }
}

#[async_trait]
impl<F, Fut> PageFetcher for FnFetcher<F>
where
    F: Fn(PageRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Page>> + Send,
{
    async fn fetch_page(&self, request: PageRequest) -> Result<Page> {
        (self.f)(request).await
    }
}

impl<F> std::fmt::Debug for FnFetcher<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFetcher").finish_non_exhaustive()
    }
}

// ============================================================================
// Walk Options
// ============================================================================

/// Shared flag that stops a walk before its next page fetch
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds and sizing for a pagination walk
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Records requested per page
    pub page_size: u32,
    /// Fail once this many pages were fetched and the server still has more
    pub max_pages: Option<u32>,
    /// Fail if the walk runs longer than this
    pub deadline: Option<Duration>,
    /// External cancellation
    pub cancel: Option<CancelFlag>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: None,
            deadline: None,
            cancel: None,
        }
    }
}

impl WalkOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Cap the number of pages
    #[must_use]
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Cap the wall-clock time of the walk
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Attach a cancellation flag
    #[must_use]
    pub fn cancel_on(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }
}

/// Summary of a completed walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Pages fetched
    pub pages: u32,
    /// Records accumulated
    pub records: usize,
    /// `pagination.total` reported by the last page
    pub total_reported: u64,
    /// Wall-clock duration
    pub elapsed: Duration,
}
