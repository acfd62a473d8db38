//! Business logic services for the dashboard.
//!
//! # Services
//!
//! - `auth` - Password registration, login and profile management
//! - `demo_api` - Cached client for the public demo data API
//! - `email` - Welcome email delivery via SMTP
//! - `stats` - Dashboard cards and chart data
//! - `undo` - Session-held undo for deleted users
//! - `uploads` - Base64 image uploads written to disk

pub mod auth;
pub mod demo_api;
pub mod email;
pub mod stats;
pub mod undo;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use demo_api::{DemoApiClient, DemoApiError, DemoProduct, DemoUser};
pub use email::{EmailError, EmailService};
pub use stats::DashboardStats;
pub use undo::UndoTicket;
pub use uploads::{ImageStore, UploadError};
