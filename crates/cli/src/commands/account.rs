//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! bo-cli account create -e admin@backoffice.dev -n "Ada Admin" -p 's3cure-pass' -r admin
//! ```

use backoffice_admin::services::{AuthError, AuthService};
use backoffice_core::AccountRole;
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur while creating an account.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid role: {0}. Valid roles: admin, user")]
    InvalidRole(String),

    #[error("Account already exists with email: {0}")]
    AccountExists(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error(transparent)]
    Auth(AuthError),
}

/// Parse the `--role` argument.
fn parse_role(role: &str) -> Result<AccountRole, AccountError> {
    role.parse()
        .map_err(|_| AccountError::InvalidRole(role.to_owned()))
}

/// Create an account with a password.
///
/// Returns the new account's id.
pub async fn create(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<i32, AccountError> {
    let role = parse_role(role)?;
    let pool = connect().await?;

    tracing::info!("Creating account: {} ({})", email, role);

    let account = AuthService::new(&pool)
        .register_with_role(name, email, password, role)
        .await
        .map_err(|e| match e {
            AuthError::UserAlreadyExists => AccountError::AccountExists(email.to_owned()),
            AuthError::Validation(errors) => AccountError::Invalid(
                errors
                    .iter()
                    .map(|(field, message)| format!("{field}: {message}"))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            other => AccountError::Auth(other),
        })?;

    tracing::info!(
        "Account created successfully! ID: {}, Email: {}, Role: {}",
        account.id,
        account.email,
        account.role
    );

    Ok(account.id.as_i32())
}
