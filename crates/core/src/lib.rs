//! Backoffice Core - Shared types library.
//!
//! This crate provides common types used across all Backoffice components:
//! - `admin` - The dashboard server (pages + JSON API)
//! - `cli` - Command-line tools for migrations, accounts and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, roles and field errors

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
