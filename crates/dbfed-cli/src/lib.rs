//! # dbfed-cli
//!
//! Command-line checks for a database user federation setup.
//!
//! The `dbfed` binary loads a provider configuration from TOML and runs the
//! provider's own operations against the live database:
//! - `ping`: connection check
//! - `user`: lookup by username or storage id
//! - `search` / `count`: listing and counting with paging
//! - `verify`: password check

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
