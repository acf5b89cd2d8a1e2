//! CLI commands and argument parsing

use crate::api::Endpoint;
use crate::types::LogLevel;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MPS data-export API client
#[derive(Parser, Debug)]
#[command(name = "mps-client")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Server base URL (overrides config and MPS_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API key (overrides config and MPS_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Username for session login
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Password for session login
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level selected by `--verbose`
    pub fn log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check username and password, print the session user, then log out
    Login,

    /// Print the user the server associates with the credentials
    Me,

    /// Fetch a single page
    Get {
        /// Endpoint slug, e.g. recent-mo
        endpoint: Endpoint,

        /// Records per page (defaults to the configured page size)
        #[arg(long)]
        limit: Option<u32>,

        /// Records to skip
        #[arg(long, default_value = "0")]
        offset: u64,

        /// Filter as key=value (repeatable)
        #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },

    /// Fetch every page of an endpoint
    FetchAll {
        /// Endpoint slug, e.g. production-log
        endpoint: Endpoint,

        /// Records per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<u32>,

        /// Fail if more than this many pages are needed
        #[arg(long)]
        max_pages: Option<u32>,

        /// Fail if the walk takes longer than this
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Filter as key=value (repeatable)
        #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Write records to this file instead of stdout (.jsonl/.ndjson for JSON Lines)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List endpoints and their filters
    Endpoints,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
    /// One record per line
    Jsonl,
}

fn parse_filter(s: &str) -> std::result::Result<(String, String), String> {
    crate::pagination::FilterSet::parse_pair(s).map_err(|e| e.to_string())
}
