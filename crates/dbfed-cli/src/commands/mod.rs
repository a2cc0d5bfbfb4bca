//! Command implementations.

pub mod ping;
pub mod user;
pub mod verify;

pub use ping::run_ping;
pub use user::{run_count, run_search, run_user};
pub use verify::run_verify;

use dbfed_federation::{DbUserStorageProvider, RealmContext};
use uuid::Uuid;

use crate::{CliConfig, CliResult};

/// Connects a provider from the CLI configuration.
pub async fn connect(
    config: &CliConfig,
    database_url: Option<&str>,
) -> CliResult<DbUserStorageProvider> {
    let provider_config = config.provider_config(database_url)?;
    let provider = DbUserStorageProvider::connect(provider_config).await?;
    Ok(provider)
}

/// Realm the CLI acts in.
#[must_use]
pub fn realm(config: &CliConfig) -> RealmContext {
    RealmContext::new(Uuid::now_v7(), config.realm.clone())
}
