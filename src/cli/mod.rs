//! CLI module
//!
//! Command-line interface for the MPS API.
//!
//! # Commands
//!
//! - `login` - Log in and print the session user
//! - `me` - Print the authenticated user
//! - `get` - Fetch one page of an endpoint
//! - `fetch-all` - Walk every page of an endpoint, optionally exporting to a file
//! - `endpoints` - List endpoints and their filters

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::{CommandOutput, Runner};
