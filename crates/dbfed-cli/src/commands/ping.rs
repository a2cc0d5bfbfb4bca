//! Connection check.

use dbfed_federation::{DbUserStorageProvider, UserStorageProvider};

use crate::output::success;

/// Runs the connection check.
pub async fn run_ping(provider: &DbUserStorageProvider) -> crate::CliResult<()> {
    provider.test_connection().await?;

    let config = provider.config();
    success(&format!(
        "Connected to {} ({}) as provider '{}'",
        config.pool.redacted_url(),
        config.dialect,
        config.id
    ));
    Ok(())
}
