//! Authentication error types.

use backoffice_core::FieldErrors;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// New password too weak.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Registration or profile input failed validation.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error: {0}")]
    PasswordHash(String),
}
