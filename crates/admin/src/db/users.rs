//! Directory user repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use backoffice_core::{Email, Gender, UserId};

use super::RepositoryError;
use crate::models::{User, UserDraft};

const USER_COLUMNS: &str = "id, first_name, last_name, age, gender, email, phone, \
                            date_of_birth, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    first_name: String,
    last_name: String,
    age: i32,
    gender: Gender,
    email: String,
    phone: String,
    date_of_birth: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email for user {}: {e}", row.id))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            age: row.age,
            gender: row.gender,
            email,
            phone: row.phone,
            date_of_birth: row.date_of_birth,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Repository for directory users.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every user ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM admin.directory_user ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM admin.directory_user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, draft: &UserDraft) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO admin.directory_user
                 (first_name, last_name, age, gender, email, phone, date_of_birth)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(draft.age)
        .bind(draft.gender)
        .bind(draft.email.as_str())
        .bind(&draft.phone)
        .bind(draft.date_of_birth)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Replace every field of a user (last write wins).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update(&self, id: UserId, draft: &UserDraft) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE admin.directory_user
             SET first_name = $2, last_name = $3, age = $4, gender = $5,
                 email = $6, phone = $7, date_of_birth = $8, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(draft.age)
        .bind(draft.gender)
        .bind(draft.email.as_str())
        .bind(&draft.phone)
        .bind(draft.date_of_birth)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a user, returning the removed row so it can be restored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn delete(&self, id: UserId) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "DELETE FROM admin.directory_user WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Re-insert a previously deleted user under its original ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the ID has been reused.
    pub async fn restore(&self, user: &User) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            "INSERT INTO admin.directory_user
                 (id, first_name, last_name, age, gender, email, phone, date_of_birth,
                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.age)
        .bind(user.gender)
        .bind(user.email.as_str())
        .bind(&user.phone)
        .bind(user.date_of_birth)
        .bind(user.created_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::conflict_on_unique(e, "user already exists"))?;

        row.try_into()
    }

    /// Count all users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin.directory_user")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
