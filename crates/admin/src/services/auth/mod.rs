//! Authentication service.
//!
//! Email + password accounts with Argon2id hashes.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use backoffice_core::{AccountId, AccountRole, Email, FieldErrors};

use crate::db::RepositoryError;
use crate::db::accounts::AccountRepository;
use crate::models::Account;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum display name length.
pub const MIN_NAME_LENGTH: usize = 2;

/// Authentication service.
pub struct AuthService<'a> {
    accounts: AccountRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool),
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new account with the default role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for bad input and
    /// `AuthError::UserAlreadyExists` when the email is taken.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AuthError> {
        self.register_with_role(name, email, password, AccountRole::User)
            .await
    }

    /// Register a new account with an explicit role (CLI).
    ///
    /// # Errors
    ///
    /// See [`AuthService::register`].
    pub async fn register_with_role(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: AccountRole,
    ) -> Result<Account, AuthError> {
        let (name, email) =
            validate_registration(name, email, password).map_err(AuthError::Validation)?;
        let password_hash = hash_password(password)?;

        self.accounts
            .create(&name, &email, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a malformed or unknown email
    /// and for a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (account, password_hash) = self
            .accounts
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(account)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Update display name and photo.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` when the name is too short.
    pub async fn update_profile(
        &self,
        id: AccountId,
        name: &str,
        photo: Option<&str>,
    ) -> Result<Account, AuthError> {
        let mut errors = FieldErrors::new();
        let name = name.trim();
        check_name(name, &mut errors);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let photo = photo.map(str::trim).filter(|p| !p.is_empty());
        Ok(self.accounts.update_profile(id, name, photo).await?)
    }

    /// Change the password after re-checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when `current` is wrong and
    /// `AuthError::WeakPassword` when `new` is too short.
    pub async fn change_password(
        &self,
        id: AccountId,
        current: &str,
        new: &str,
    ) -> Result<(), AuthError> {
        validate_password(new)?;

        let password_hash = self.accounts.get_password_hash(id).await?;
        verify_password(current, &password_hash)?;

        let new_hash = hash_password(new)?;
        self.accounts.update_password_hash(id, &new_hash).await?;
        Ok(())
    }

    /// Reload an account (e.g. to refresh the session copy).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.get_by_id(id).await?)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Validate registration input, returning the trimmed name and parsed email.
///
/// # Errors
///
/// Returns one message per failing field (`name`, `email`, `password`).
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
) -> Result<(String, Email), FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = name.trim();
    check_name(name, &mut errors);

    let email = Email::parse(email).ok();
    errors.check(email.is_none(), "email", "Invalid email address");

    if let Err(AuthError::WeakPassword(msg)) = validate_password(password) {
        errors.add("password", msg);
    }

    match email {
        Some(email) if errors.is_empty() => Ok((name.to_string(), email)),
        _ => Err(errors),
    }
}

fn check_name(name: &str, errors: &mut FieldErrors) {
    errors.check(name.is_empty(), "name", "Name is required");
    errors.check(
        name.chars().count() < MIN_NAME_LENGTH,
        "name",
        "Name must be at least 2 characters",
    );
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a PHC hash string.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("whatever", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_weak_password() {
        assert!(matches!(
            validate_password("12345"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_validate_registration_messages() {
        let errors = validate_registration(" J ", "nope", "123").unwrap_err();
        assert_eq!(errors.get("name"), Some("Name must be at least 2 characters"));
        assert_eq!(errors.get("email"), Some("Invalid email address"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );

        let errors = validate_registration("", "a@b.co", "secret1").unwrap_err();
        assert_eq!(errors.get("name"), Some("Name is required"));
    }

    #[test]
    fn test_validate_registration_normalizes() {
        let (name, email) =
            validate_registration("  Jane Doe ", "Jane@Example.com", "secret1").unwrap();
        assert_eq!(name, "Jane Doe");
        assert_eq!(email.as_str(), "jane@example.com");
    }
}
