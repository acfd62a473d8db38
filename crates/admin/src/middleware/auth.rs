//! Authentication extractors for the dashboard.
//!
//! Page requests without a session are redirected to `/login`; `/api/*`
//! requests get a JSON 401 so the browser-side auth poll can react.

use axum::{
    Json,
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::models::{CurrentAccount, session_keys};

/// Login page path.
pub const LOGIN_PATH: &str = "/login";

/// Where logged-in users land.
pub const HOME_PATH: &str = "/admin";

/// Extractor that requires a logged-in account.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(account): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", account.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentAccount);

/// Extractor that requires an account with the admin role.
///
/// Not logged in is handled like [`RequireAuth`]; logged in without the
/// role is 403.
pub struct RequireAdmin(pub CurrentAccount);

/// Extractor that optionally gets the current account.
pub struct OptionalAuth(pub Option<CurrentAccount>);

/// Why an auth extractor rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to login page (for HTML requests).
    RedirectToLogin,
    /// JSON 401 (for API requests).
    Unauthorized,
    /// Logged in but not allowed.
    Forbidden { api: bool },
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Not authenticated" })),
            )
                .into_response(),
            Self::Forbidden { api: true } => (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": "Admin access required" })),
            )
                .into_response(),
            Self::Forbidden { api: false } => {
                (StatusCode::FORBIDDEN, "Admin access required").into_response()
            }
        }
    }
}

fn is_api_request(parts: &Parts) -> bool {
    // Nested routers see a stripped URI
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |uri| uri.0.path());
    path.starts_with("/api/")
}

async fn current_account(parts: &Parts) -> Option<CurrentAccount> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentAccount>(session_keys::CURRENT_ACCOUNT)
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Failed to read session"))
        .ok()
        .flatten()
}

async fn require_account(parts: &Parts) -> Result<CurrentAccount, AuthRejection> {
    let account = current_account(parts).await.ok_or_else(|| {
        if is_api_request(parts) {
            AuthRejection::Unauthorized
        } else {
            AuthRejection::RedirectToLogin
        }
    })?;

    tracing::Span::current().record("account_id", account.id.as_i32());
    Ok(account)
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_account(parts).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account = require_account(parts).await?;
        if !account.is_admin() {
            return Err(AuthRejection::Forbidden {
                api: is_api_request(parts),
            });
        }
        Ok(Self(account))
    }
}

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_account(parts).await))
    }
}

/// Helper to set the current account in the session (login, profile update).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_account(
    session: &Session,
    account: &CurrentAccount,
) -> Result<(), tower_sessions::session::Error> {
    set_sentry_user(account.id.as_i32(), Some(account.email.as_str()));
    session.insert(session_keys::CURRENT_ACCOUNT, account).await
}

/// Helper to end the session (logout).
///
/// Flushes everything, including any pending undo ticket.
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_current_account(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    clear_sentry_user();
    session.flush().await
}
