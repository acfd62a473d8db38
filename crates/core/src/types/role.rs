//! Dashboard account roles.

use serde::{Deserialize, Serialize};

/// Role of a dashboard account.
///
/// Every registered account starts as `User`; `Admin` accounts are created
/// from the CLI and may run destructive bulk operations such as populating
/// products from the demo API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.account_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Admin,
    #[default]
    User,
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(format!("invalid account role: {s}")),
        }
    }
}
