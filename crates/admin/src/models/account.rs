//! Dashboard account domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backoffice_core::{AccountId, AccountRole, Email};

/// A dashboard operator who can sign in.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
    pub role: AccountRole,
    /// Profile photo URL (`/uploads/...`, remote URL or data URL).
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session-stored account identity.
///
/// This is also the `user` object returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAccount {
    pub id: AccountId,
    pub name: String,
    pub email: Email,
    pub role: AccountRole,
    pub photo: Option<String>,
}

impl CurrentAccount {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == AccountRole::Admin
    }

    /// Up to two uppercase initials for the avatar fallback.
    #[must_use]
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

impl From<&Account> for CurrentAccount {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            photo: account.photo.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn current(name: &str) -> CurrentAccount {
        CurrentAccount {
            id: AccountId::new(1),
            name: name.to_string(),
            email: Email::parse("ops@backoffice.dev").unwrap(),
            role: AccountRole::User,
            photo: None,
        }
    }

    #[test]
    fn test_initials() {
        assert_eq!(current("jane doe").initials(), "JD");
        assert_eq!(current("Cher").initials(), "C");
        assert_eq!(current("Mary Ann Evans").initials(), "MA");
    }

    #[test]
    fn test_serializes_as_auth_user_shape() {
        let json = serde_json::to_value(current("Jane Doe")).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["email"], "ops@backoffice.dev");
        assert_eq!(json["role"], "user");
        assert!(json["photo"].is_null());
    }
}
