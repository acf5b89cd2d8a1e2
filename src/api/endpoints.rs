//! Data endpoints and the filters each one recognizes

use crate::error::{Error, Result};
use crate::pagination::FilterSet;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static DATE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}( \d{2}:\d{2}:\d{2})?$").expect("valid date regex")
});

// ============================================================================
// Filter Specs
// ============================================================================

/// Accepted values for a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Any string, matched exactly by the server
    Text,
    /// `true` or `false`
    Bool,
    /// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`
    Date,
    /// One of a fixed set of values
    OneOf(&'static [&'static str]),
}

impl FilterKind {
    /// Check a value against this kind, returning a reason on mismatch
    pub fn check(&self, value: &str) -> std::result::Result<(), String> {
        match self {
            FilterKind::Text => Ok(()),
            FilterKind::Bool => match value {
                "true" | "false" => Ok(()),
                _ => Err(format!("expected 'true' or 'false', got '{value}'")),
            },
            FilterKind::Date => check_date(value),
            FilterKind::OneOf(allowed) => {
                if allowed.iter().any(|a| *a == value) {
                    Ok(())
                } else {
                    Err(format!(
                        "expected one of {}, got '{value}'",
                        allowed.join("|")
                    ))
                }
            }
        }
    }

    /// Short description for listings
    pub fn describe(&self) -> String {
        match self {
            FilterKind::Text => "text".to_string(),
            FilterKind::Bool => "true|false".to_string(),
            FilterKind::Date => "YYYY-MM-DD[ HH:MM:SS]".to_string(),
            FilterKind::OneOf(allowed) => allowed.join("|"),
        }
    }
}

fn check_date(value: &str) -> std::result::Result<(), String> {
    let invalid = || format!("expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS, got '{value}'");

    if !DATE_SHAPE.is_match(value) {
        return Err(invalid());
    }

    let parsed = if value.len() == 10 {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").map(|_| ())
    } else {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|_| ())
    };
    parsed.map_err(|_| invalid())
}

/// A filter recognized by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSpec {
    /// Query parameter name
    pub name: &'static str,
    /// Accepted values
    pub kind: FilterKind,
}

const fn text(name: &'static str) -> FilterSpec {
    FilterSpec {
        name,
        kind: FilterKind::Text,
    }
}

const fn date(name: &'static str) -> FilterSpec {
    FilterSpec {
        name,
        kind: FilterKind::Date,
    }
}

const RECENT_MO_FILTERS: &[FilterSpec] = &[
    text("mo_name"),
    FilterSpec {
        name: "ready",
        kind: FilterKind::Bool,
    },
    text("state"),
];

const MANUFACTURING_IDENTITY_FILTERS: &[FilterSpec] = &[
    text("mo_name"),
    text("sku"),
    date("created_at_from"),
    date("created_at_to"),
    date("finished_at_from"),
    date("finished_at_to"),
];

const PRODUCTION_LOG_FILTERS: &[FilterSpec] = &[
    text("mo_name"),
    FilterSpec {
        name: "status",
        kind: FilterKind::OneOf(&["start", "end"]),
    },
    date("from_date"),
    date("to_date"),
];

const MASTER_AUTHENTICITY_VENDOR_FILTERS: &[FilterSpec] = &[text("roll"), text("authenticity")];

const AUTHENTICITY_USED_RM_FILTERS: &[FilterSpec] = &[text("transfer_id"), text("authenticity")];

const AUTHENTICITY_USED_LINE_FILTERS: &[FilterSpec] = &[text("mo_name"), text("sku_barcode")];

// ============================================================================
// Endpoint
// ============================================================================

/// A paginated data endpoint under `/api/data`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    /// Manufacturing orders pulled from the ERP
    RecentMo,
    /// Production runs per MO
    ManufacturingIdentity,
    /// Start/end events of production
    ProductionLog,
    /// Vendor authenticity master data
    MasterAuthenticityVendor,
    /// Authenticity codes used per raw material transfer
    AuthenticityUsedRm,
    /// Authenticity codes used per production line
    AuthenticityUsedLine,
}

impl Endpoint {
    /// Every endpoint, in listing order
    pub const ALL: [Endpoint; 6] = [
        Endpoint::RecentMo,
        Endpoint::ManufacturingIdentity,
        Endpoint::ProductionLog,
        Endpoint::MasterAuthenticityVendor,
        Endpoint::AuthenticityUsedRm,
        Endpoint::AuthenticityUsedLine,
    ];

    /// Path slug, e.g. `recent-mo`
    pub fn slug(&self) -> &'static str {
        match self {
            Endpoint::RecentMo => "recent-mo",
            Endpoint::ManufacturingIdentity => "manufacturing-identity",
            Endpoint::ProductionLog => "production-log",
            Endpoint::MasterAuthenticityVendor => "master-authenticity-vendor",
            Endpoint::AuthenticityUsedRm => "authenticity-used-rm",
            Endpoint::AuthenticityUsedLine => "authenticity-used-line",
        }
    }

    /// Request path relative to the base URL
    pub fn path(&self) -> String {
        format!("/api/data/{}", self.slug())
    }

    /// Filters this endpoint recognizes
    pub fn filters(&self) -> &'static [FilterSpec] {
        match self {
            Endpoint::RecentMo => RECENT_MO_FILTERS,
            Endpoint::ManufacturingIdentity => MANUFACTURING_IDENTITY_FILTERS,
            Endpoint::ProductionLog => PRODUCTION_LOG_FILTERS,
            Endpoint::MasterAuthenticityVendor => MASTER_AUTHENTICITY_VENDOR_FILTERS,
            Endpoint::AuthenticityUsedRm => AUTHENTICITY_USED_RM_FILTERS,
            Endpoint::AuthenticityUsedLine => AUTHENTICITY_USED_LINE_FILTERS,
        }
    }

    /// Look up a recognized filter by name
    pub fn filter(&self, name: &str) -> Option<&'static FilterSpec> {
        self.filters().iter().find(|spec| spec.name == name)
    }

    /// Reject unknown filter keys and malformed values
    pub fn validate(&self, filters: &FilterSet) -> Result<()> {
        for (key, value) in filters.iter() {
            let Some(spec) = self.filter(key) else {
                let known: Vec<&str> = self.filters().iter().map(|s| s.name).collect();
                return Err(Error::invalid_filter(
                    self.slug(),
                    key,
                    format!("unknown filter, expected one of {}", known.join(", ")),
                ));
            };
            spec.kind
                .check(value)
                .map_err(|message| Error::invalid_filter(self.slug(), key, message))?;
        }
        Ok(())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    /// Accepts the slug (`recent-mo`) or the table name (`recent_mo`)
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Endpoint::ALL
            .into_iter()
            .find(|e| e.slug() == normalized)
            .ok_or_else(|| Error::UnknownEndpoint {
                name: s.to_string(),
            })
    }
}
