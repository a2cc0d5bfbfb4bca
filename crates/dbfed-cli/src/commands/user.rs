//! User lookup, search and count commands.

use dbfed_federation::{
    DbUserStorageProvider, FederatedUser, HostUser, RealmContext, UserCountQuery,
    UserStorageProvider,
};
use dbfed_storage::PagingWindow;
use serde::Serialize;
use tabled::Tabled;

use crate::config::OutputFormat;
use crate::CliError;
use crate::output::{output, output_single, warning};

/// User representation for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct UserDisplay {
    /// Storage id.
    #[tabled(rename = "Storage ID")]
    pub id: String,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// First name.
    #[tabled(rename = "First Name")]
    pub first_name: String,
    /// Last name.
    #[tabled(rename = "Last Name")]
    pub last_name: String,
}

impl From<&FederatedUser> for UserDisplay {
    fn from(user: &FederatedUser) -> Self {
        Self {
            id: HostUser::id(user).to_string(),
            username: user.username().to_string(),
            email: user.email().unwrap_or_default().to_string(),
            first_name: user.first_name().unwrap_or_default().to_string(),
            last_name: user.last_name().unwrap_or_default().to_string(),
        }
    }
}

/// Shows a single user by username or storage id.
pub async fn run_user(
    provider: &DbUserStorageProvider,
    realm: &RealmContext,
    name: &str,
    by_id: bool,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let user = if by_id {
        provider.get_user_by_id(realm, name).await?
    } else {
        provider.get_user_by_username(realm, name).await?
    };
    let user = user.ok_or_else(|| CliError::user_not_found(name))?;

    match format {
        // All attributes, not just the table columns.
        OutputFormat::Json => output_single(user.record(), format),
        OutputFormat::Table => output_single(&UserDisplay::from(&user), format),
    }
}

/// Lists users matching an optional term.
pub async fn run_search(
    provider: &DbUserStorageProvider,
    realm: &RealmContext,
    term: Option<&str>,
    first: i64,
    max: i64,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let window = PagingWindow::normalize(first, max);
    if window.is_unbounded() && first > 0 {
        warning("--first is ignored without a positive --max");
    }
    let users = match term {
        Some(term) => provider.search_users(realm, term, Some(window)).await?,
        None => provider.get_users(realm, Some(window)).await?,
    };

    let rows: Vec<UserDisplay> = users.iter().map(UserDisplay::from).collect();
    output(&rows, format)
}

/// Counts users matching an optional term.
pub async fn run_count(
    provider: &DbUserStorageProvider,
    realm: &RealmContext,
    term: Option<&str>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let query = term.map_or(UserCountQuery::All, |t| UserCountQuery::Search(t.to_string()));
    let count = provider.count_users(realm, &query).await?;

    match format {
        OutputFormat::Table => println!("{count}"),
        OutputFormat::Json => output_single(&serde_json::json!({ "count": count }), format)?,
    }
    Ok(())
}
