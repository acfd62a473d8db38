//! Subcommand implementations.

pub mod account;
pub mod migrate;
pub mod seed;

use sqlx::PgPool;

use backoffice_admin::config::{ConfigError, database_url_from_env};
use backoffice_admin::db;

/// Errors shared by every command that talks to the database.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Load `.env` and open a pool against the dashboard database.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    Ok(db::create_pool(&database_url).await?)
}
