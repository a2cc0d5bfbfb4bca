//! Password check.

use dbfed_federation::{
    CredentialInput, CredentialValidator, DbUserStorageProvider, RealmContext,
    UserStorageProvider,
};

use crate::CliError;
use crate::output::{prompt_password, success};

/// Checks a user's password against the database.
pub async fn run_verify(
    provider: &DbUserStorageProvider,
    realm: &RealmContext,
    username: &str,
    password: Option<String>,
) -> crate::CliResult<()> {
    let user = provider
        .get_user_by_username(realm, username)
        .await?
        .ok_or_else(|| CliError::user_not_found(username))?;

    let password = match password {
        Some(p) => p,
        None => prompt_password("Password: ")?,
    };

    if provider
        .is_valid(realm, &user, &CredentialInput::password(password))
        .await?
    {
        success(&format!("Password accepted for '{username}'"));
        Ok(())
    } else {
        Err(CliError::CredentialRejected(username.to_string()))
    }
}
