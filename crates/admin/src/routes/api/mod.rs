//! JSON API consumed by the dashboard scripts and external clients.
//!
//! Every error body is `{"message": ...}`, with `errors` added for
//! validation failures (see [`crate::error::AppError`]).

pub mod auth;
pub mod extract;
pub mod products;
pub mod stats;
pub mod upload;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

pub use extract::{ApiJson, ApiPath};

/// `{"message": ...}` body for endpoints that only confirm an action.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Build the complete API router.
///
/// `trust_proxy` decides whether the login limiter keys on forwarded headers.
pub fn router(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .merge(auth::router(trust_proxy))
        .merge(users::router())
        .merge(products::router())
        .merge(upload::router())
        .merge(stats::router())
}
