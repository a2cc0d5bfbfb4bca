//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::OutputFormat;

/// dbfed - check a database user federation setup.
#[derive(Debug, Parser)]
#[command(name = "dbfed")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Provider configuration file.
    #[arg(short, long, env = "DBFED_CONFIG", default_value = "dbfed.toml")]
    pub config: PathBuf,

    /// Database URL (overrides config).
    #[arg(long, env = "DBFED_DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Output format (overrides config).
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check the database connection.
    Ping,

    /// Show a single user.
    User {
        /// Username, or storage id with `--id`.
        name: String,

        /// Look up by storage id instead of username.
        #[arg(long)]
        id: bool,
    },

    /// List users, optionally filtered by a search term.
    Search {
        /// Search term matched against the configured search query.
        term: Option<String>,

        /// Index of the first result.
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        first: i64,

        /// Maximum number of results (zero or negative for all).
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        max: i64,
    },

    /// Count users, optionally filtered by a search term.
    Count {
        /// Search term.
        term: Option<String>,
    },

    /// Check a user's password.
    Verify {
        /// Username.
        username: String,

        /// Password (prompted for if not given).
        #[arg(long, env = "DBFED_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}
