//! Typed filter builders
//!
//! Each builder converts into a [`FilterSet`] carrying only the fields that
//! were set. Values are validated against the endpoint when a request is made.

use crate::error::{Error, Result};
use crate::pagination::FilterSet;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A value usable as a date filter
pub trait FilterDate {
    /// Format as the server expects
    fn to_filter_value(&self) -> String;
}

impl FilterDate for NaiveDate {
    fn to_filter_value(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl FilterDate for NaiveDateTime {
    fn to_filter_value(&self) -> String {
        self.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl FilterDate for &str {
    fn to_filter_value(&self) -> String {
        (*self).to_string()
    }
}

impl FilterDate for String {
    fn to_filter_value(&self) -> String {
        self.clone()
    }
}

// ============================================================================
// recent-mo
// ============================================================================

/// Filters for `recent-mo`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentMoFilter {
    /// Exact manufacturing order name
    pub mo_name: Option<String>,
    /// Ready-for-production flag
    pub ready: Option<bool>,
    /// ERP state
    pub state: Option<String>,
}

impl RecentMoFilter {
    /// Empty filter matching every order
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the order with this name, e.g. `MO/00123`
    #[must_use]
    pub fn mo_name(mut self, mo_name: impl Into<String>) -> Self {
        self.mo_name = Some(mo_name.into());
        self
    }

    /// Only orders marked (or not marked) ready for production
    #[must_use]
    pub fn ready(mut self, ready: bool) -> Self {
        self.ready = Some(ready);
        self
    }

    /// ERP state, e.g. `confirmed`
    #[must_use]
    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

impl From<RecentMoFilter> for FilterSet {
    fn from(filter: RecentMoFilter) -> Self {
        let mut set = FilterSet::new();
        set.insert_opt("mo_name", filter.mo_name);
        set.insert_opt("ready", filter.ready.map(|r| r.to_string()));
        set.insert_opt("state", filter.state);
        set
    }
}

// ============================================================================
// manufacturing-identity
// ============================================================================

/// Filters for `manufacturing-identity`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManufacturingIdentityFilter {
    /// Exact manufacturing order name
    pub mo_name: Option<String>,
    /// Exact product SKU
    pub sku: Option<String>,
    /// Earliest creation time, inclusive
    pub created_at_from: Option<String>,
    /// Latest creation time, inclusive
    pub created_at_to: Option<String>,
    /// Earliest finish time, inclusive
    pub finished_at_from: Option<String>,
    /// Latest finish time, inclusive
    pub finished_at_to: Option<String>,
}

impl ManufacturingIdentityFilter {
    /// Empty filter matching every run
    pub fn new() -> Self {
        Self::default()
    }

    /// Only runs of this manufacturing order
    #[must_use]
    pub fn mo_name(mut self, mo_name: impl Into<String>) -> Self {
        self.mo_name = Some(mo_name.into());
        self
    }

    /// Only runs producing this SKU
    #[must_use]
    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    /// Runs created within `[from, to]`, inclusive
    #[must_use]
    pub fn created_between(mut self, from: impl FilterDate, to: impl FilterDate) -> Self {
        self.created_at_from = Some(from.to_filter_value());
        self.created_at_to = Some(to.to_filter_value());
        self
    }

    /// Runs created at or after `from`
    #[must_use]
    pub fn created_from(mut self, from: impl FilterDate) -> Self {
        self.created_at_from = Some(from.to_filter_value());
        self
    }

    /// Runs created at or before `to`
    #[must_use]
    pub fn created_to(mut self, to: impl FilterDate) -> Self {
        self.created_at_to = Some(to.to_filter_value());
        self
    }

    /// Runs finished within `[from, to]`, inclusive
    #[must_use]
    pub fn finished_between(mut self, from: impl FilterDate, to: impl FilterDate) -> Self {
        self.finished_at_from = Some(from.to_filter_value());
        self.finished_at_to = Some(to.to_filter_value());
        self
    }
}

impl From<ManufacturingIdentityFilter> for FilterSet {
    fn from(filter: ManufacturingIdentityFilter) -> Self {
        let mut set = FilterSet::new();
        set.insert_opt("mo_name", filter.mo_name);
        set.insert_opt("sku", filter.sku);
        set.insert_opt("created_at_from", filter.created_at_from);
        set.insert_opt("created_at_to", filter.created_at_to);
        set.insert_opt("finished_at_from", filter.finished_at_from);
        set.insert_opt("finished_at_to", filter.finished_at_to);
        set
    }
}

// ============================================================================
// production-log
// ============================================================================

/// Event type recorded in the production log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionStatus {
    /// Production started
    Start,
    /// Production ended
    End,
}

impl ProductionStatus {
    /// Query value, `start` or `end`
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::Start => "start",
            ProductionStatus::End => "end",
        }
    }
}

impl fmt::Display for ProductionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(ProductionStatus::Start),
            "end" => Ok(ProductionStatus::End),
            other => Err(Error::invalid_filter(
                "production-log",
                "status",
                format!("expected start|end, got '{other}'"),
            )),
        }
    }
}

/// Filters for `production-log`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductionLogFilter {
    /// Exact manufacturing order name
    pub mo_name: Option<String>,
    /// Event type
    pub status: Option<ProductionStatus>,
    /// Earliest event time, inclusive
    pub from_date: Option<String>,
    /// Latest event time, inclusive
    pub to_date: Option<String>,
}

impl ProductionLogFilter {
    /// Empty filter matching every event
    pub fn new() -> Self {
        Self::default()
    }

    /// Only events of this manufacturing order
    #[must_use]
    pub fn mo_name(mut self, mo_name: impl Into<String>) -> Self {
        self.mo_name = Some(mo_name.into());
        self
    }

    /// Only start or only end events
    #[must_use]
    pub fn status(mut self, status: ProductionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Events at or after `from`
    #[must_use]
    pub fn from_date(mut self, from: impl FilterDate) -> Self {
        self.from_date = Some(from.to_filter_value());
        self
    }

    /// Events at or before `to`
    #[must_use]
    pub fn to_date(mut self, to: impl FilterDate) -> Self {
        self.to_date = Some(to.to_filter_value());
        self
    }
}

impl From<ProductionLogFilter> for FilterSet {
    fn from(filter: ProductionLogFilter) -> Self {
        let mut set = FilterSet::new();
        set.insert_opt("mo_name", filter.mo_name);
        set.insert_opt("status", filter.status.map(|s| s.as_str()));
        set.insert_opt("from_date", filter.from_date);
        set.insert_opt("to_date", filter.to_date);
        set
    }
}
