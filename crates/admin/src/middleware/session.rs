//! Session middleware configuration for the dashboard.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions. Sessions expire
//! after 24 hours of inactivity. Also holds the one-shot flash (toast) helpers.

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;
use crate::models::{Flash, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "backoffice_session";

/// Session expiry time in seconds (24 hours of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// The session store rejected the schema or table name.
#[derive(Debug, thiserror::Error)]
#[error("invalid session store identifier: {0}")]
pub struct SessionStoreError(String);

/// Create the `PostgreSQL` session store for the `admin.session` table.
///
/// # Errors
///
/// Returns an error if the schema or table name is rejected by the store.
pub fn create_session_store(pool: &PgPool) -> Result<PostgresStore, SessionStoreError> {
    // The table is created by the admin schema migration
    PostgresStore::new(pool.clone())
        .with_schema_name("admin")
        .map_err(SessionStoreError)?
        .with_table_name("session")
        .map_err(SessionStoreError)
}

/// Wrap a session store in the cookie settings used by the dashboard.
///
/// Generic over the store so tests can use `MemoryStore`.
#[must_use]
pub fn session_layer<S>(store: S, config: &AdminConfig) -> SessionManagerLayer<S>
where
    S: tower_sessions::SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_https())
        // Lax so the login redirect after a cross-site link keeps the cookie
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Create the session layer with `PostgreSQL` store.
///
/// # Errors
///
/// Returns an error if the session store cannot be configured.
pub fn create_session_layer(
    pool: &PgPool,
    config: &AdminConfig,
) -> Result<SessionManagerLayer<PostgresStore>, SessionStoreError> {
    Ok(session_layer(create_session_store(pool)?, config))
}

/// Queue a toast for the next rendered page.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_flash(
    session: &Session,
    flash: Flash,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::FLASH, flash).await
}

/// Take the pending toast, if any. It is shown once.
///
/// Session failures are logged and treated as "no toast".
pub async fn take_flash(session: &Session) -> Option<Flash> {
    session
        .remove::<Flash>(session_keys::FLASH)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to read flash message"))
        .ok()
        .flatten()
}
