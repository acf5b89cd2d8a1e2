//! Offset pagination walker
//!
//! Repeatedly invokes a [`PageFetcher`], advancing the offset by the page
//! size, until a page reports `has_more = false`.

use super::types::{
    FilterSet, Page, PageFetcher, PageRequest, WalkOptions, WalkStats, DEFAULT_PAGE_SIZE,
};
use crate::error::{Error, Result};
use crate::types::Record;
use futures::stream::{self, Stream, TryStreamExt};
use tokio::time::Instant;
use tracing::{debug, info};

/// Tracks the position of a walk between page fetches
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// Offset of the next page to request
    pub offset: u64,
    /// Pages fetched so far
    pub pages: u32,
    /// Offset of the most recent page that was fetched successfully
    pub last_successful_offset: Option<u64>,
    /// Records fetched so far
    pub total_fetched: usize,
    /// `pagination.total` of the most recent page
    pub total_reported: u64,
    /// Set once a page reported `has_more = false`
    pub done: bool,
    started: Instant,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    /// Start a walk at offset zero
    pub fn new() -> Self {
        Self {
            offset: 0,
            pages: 0,
            last_successful_offset: None,
            total_fetched: 0,
            total_reported: 0,
            done: false,
            started: Instant::now(),
        }
    }

    /// Fail if any bound in `options` has tripped
    pub fn check_bounds(&self, options: &WalkOptions) -> Result<()> {
        if options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Err(Error::Cancelled {
                offset: self.offset,
            });
        }

        if let Some(deadline) = options.deadline {
            if self.started.elapsed() >= deadline {
                return Err(Error::DeadlineExceeded {
                    deadline_ms: deadline.as_millis() as u64,
                    offset: self.offset,
                    last_successful_offset: self.last_successful_offset,
                    records_fetched: self.total_fetched,
                });
            }
        }

        if let Some(max_pages) = options.max_pages {
            if self.pages >= max_pages {
                return Err(Error::PageLimitExceeded {
                    max_pages,
                    records_fetched: self.total_fetched,
                });
            }
        }

        Ok(())
    }

    /// Fetch the page at the current offset and advance
    pub async fn advance<F: PageFetcher + ?Sized>(
        &mut self,
        fetcher: &F,
        options: &WalkOptions,
        filters: &FilterSet,
    ) -> Result<Page> {
        self.check_bounds(options)?;

        let request = PageRequest {
            limit: options.page_size,
            offset: self.offset,
            filters: filters.clone(),
        };

        let page = fetcher
            .fetch_page(request)
            .await
            .map_err(|e| Error::PageFetch {
                offset: self.offset,
                last_successful_offset: self.last_successful_offset,
                records_fetched: self.total_fetched,
                source: Box::new(e),
            })?;

        debug!(
            offset = self.offset,
            records = page.len(),
            has_more = page.has_more(),
            total = page.pagination.total,
            "Fetched page"
        );

        self.pages += 1;
        self.total_fetched += page.len();
        self.total_reported = page.pagination.total;
        self.last_successful_offset = Some(self.offset);

        if page.has_more() {
            self.offset += u64::from(options.page_size);
        } else {
            self.done = true;
        }

        Ok(page)
    }

    /// Statistics for the walk so far
    pub fn stats(&self) -> WalkStats {
        WalkStats {
            pages: self.pages,
            records: self.total_fetched,
            total_reported: self.total_reported,
            elapsed: self.started.elapsed(),
        }
    }
}

/// Walks every page of a paginated resource
#[derive(Debug, Clone, Default)]
pub struct PaginatedFetcher {
    options: WalkOptions,
}

impl PaginatedFetcher {
    /// Create a walker with default options (page size 100, unbounded)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a walker with the given options
    pub fn with_options(options: WalkOptions) -> Self {
        Self { options }
    }

    /// Get the walk options
    pub fn options(&self) -> &WalkOptions {
        &self.options
    }

    /// Fetch every page and return the records in server order.
    ///
    /// Any error aborts the walk; records accumulated so far are dropped.
    pub async fn fetch_all<F: PageFetcher + ?Sized>(
        &self,
        fetcher: &F,
        filters: &FilterSet,
    ) -> Result<Vec<Record>> {
        let (records, _) = self.fetch_all_with_stats(fetcher, filters).await?;
        Ok(records)
    }

    /// Like [`fetch_all`](Self::fetch_all), also returning walk statistics
    pub async fn fetch_all_with_stats<F: PageFetcher + ?Sized>(
        &self,
        fetcher: &F,
        filters: &FilterSet,
    ) -> Result<(Vec<Record>, WalkStats)> {
        self.validate()?;

        let mut state = PaginationState::new();
        let mut accumulated = Vec::new();

        while !state.done {
            let page = state.advance(fetcher, &self.options, filters).await?;
            accumulated.extend(page.data);
        }

        let stats = state.stats();
        info!(
            pages = stats.pages,
            records = stats.records,
            total = stats.total_reported,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "Pagination complete"
        );

        Ok((accumulated, stats))
    }

    /// Stream pages as they arrive
    pub fn pages<'a, F: PageFetcher + ?Sized>(
        &'a self,
        fetcher: &'a F,
        filters: FilterSet,
    ) -> impl Stream<Item = Result<Page>> + Send + 'a {
        let validated = self.validate();
        let options = &self.options;

        stream::try_unfold(
            (PaginationState::new(), filters, validated),
            move |(mut state, filters, validated)| async move {
                validated?;
                if state.done {
                    return Ok(None);
                }
                let page = state.advance(fetcher, options, &filters).await?;
                Ok(Some((page, (state, filters, Ok(())))))
            },
        )
    }

    /// Stream records one by one, in the same order as [`fetch_all`](Self::fetch_all)
    pub fn stream<'a, F: PageFetcher + ?Sized>(
        &'a self,
        fetcher: &'a F,
        filters: FilterSet,
    ) -> impl Stream<Item = Result<Record>> + Send + 'a {
        self.pages(fetcher, filters)
            .map_ok(|page| stream::iter(page.data.into_iter().map(Ok::<Record, Error>)))
            .try_flatten()
    }

    fn validate(&self) -> Result<()> {
        if self.options.page_size == 0 {
            return Err(Error::config("page_size must be positive"));
        }
        Ok(())
    }
}

/// Fetch every page with the given page size and no walk bounds
pub async fn fetch_all<F: PageFetcher + ?Sized>(
    fetcher: &F,
    filters: &FilterSet,
    page_size: Option<u32>,
) -> Result<Vec<Record>> {
    let options = WalkOptions::new().page_size(page_size.unwrap_or(DEFAULT_PAGE_SIZE));
    PaginatedFetcher::with_options(options)
        .fetch_all(fetcher, filters)
        .await
}
