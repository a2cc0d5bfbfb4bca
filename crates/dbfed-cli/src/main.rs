//! # dbfed
//!
//! Checks a database user federation setup from the command line.

#![forbid(unsafe_code)]
#![allow(clippy::uninlined_format_args)]

use clap::Parser;
use dbfed_cli::{
    cli::{Cli, Command},
    commands::{self, run_count, run_ping, run_search, run_user, run_verify},
    config::CliConfig,
    output::error,
    CliResult,
};
use dbfed_federation::UserStorageProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match CliConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, &config).await {
        error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &CliConfig) -> CliResult<()> {
    let format = cli.output.unwrap_or(config.output_format);
    let provider = commands::connect(config, cli.database_url.as_deref()).await?;
    let realm = commands::realm(config);
    tracing::debug!(realm = %realm.name, provider = %provider.config().id, "Provider ready");

    let result = match cli.command {
        Command::Ping => run_ping(&provider).await,
        Command::User { name, id } => run_user(&provider, &realm, &name, id, format).await,
        Command::Search { term, first, max } => {
            run_search(&provider, &realm, term.as_deref(), first, max, format).await
        }
        Command::Count { term } => run_count(&provider, &realm, term.as_deref(), format).await,
        Command::Verify { username, password } => {
            run_verify(&provider, &realm, &username, password).await
        }
    };

    provider.close().await?;
    result
}
