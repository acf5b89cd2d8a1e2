//! Pagination module
//!
//! Offset/limit pagination as served by the MPS data endpoints.
//!
//! # Overview
//!
//! Every list endpoint answers with a [`Page`]: a slice of records plus
//! `pagination.total` and `pagination.has_more`. The [`PaginatedFetcher`]
//! drives any [`PageFetcher`] from offset zero, advancing by the page size,
//! until a page reports `has_more = false`. Walks can be bounded by a page
//! limit, a deadline, or a [`CancelFlag`], all checked between page fetches.

mod types;
mod walker;

pub use types::{
    from_fn, CancelFlag, FilterSet, FnFetcher, Page, PageFetcher, PageInfo, PageRequest,
    WalkOptions, WalkStats, DEFAULT_PAGE_SIZE,
};
pub use walker::{fetch_all, PaginatedFetcher, PaginationState};
