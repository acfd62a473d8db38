//! Read-only queries over the session table.

use sqlx::PgPool;

use super::RepositoryError;

/// Session table statistics for the dashboard cards.
pub struct SessionStats<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionStats<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Number of sessions that have not expired yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_sessions(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM admin.session WHERE expiry_date > NOW()",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}
