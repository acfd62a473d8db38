//! Types stored in the session.

use serde::{Deserialize, Serialize};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    /// CSS modifier for the toast.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self {
            Self::Success => "toast-success",
            Self::Error => "toast-error",
            Self::Info => "toast-info",
        }
    }
}

/// One-shot toast message carried across a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
    /// Show an "Undo" button that posts to the restore action.
    #[serde(default)]
    pub undo: bool,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
            undo: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
            undo: false,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
            undo: false,
        }
    }

    #[must_use]
    pub const fn with_undo(mut self) -> Self {
        self.undo = true;
        self
    }
}

/// Session keys.
pub mod keys {
    /// The logged-in account.
    pub const CURRENT_ACCOUNT: &str = "current_account";

    /// Most recently deleted directory user, restorable for a short window.
    pub const UNDO_USER: &str = "undo_user";

    /// Pending toast message.
    pub const FLASH: &str = "flash";
}
