//! Core types for Backoffice.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod gender;
pub mod id;
pub mod price;
pub mod role;
pub mod validation;

pub use email::{Email, EmailError};
pub use gender::{Gender, GenderError};
pub use id::*;
pub use price::{Percentage, PercentageError, Price};
pub use role::AccountRole;
pub use validation::FieldErrors;
