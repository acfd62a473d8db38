//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Database readiness
//!
//! # Auth pages
//! GET  /                              - Redirect to /admin
//! GET  /login, POST /login            - Sign in
//! GET  /register, POST /register      - Create account
//! POST /logout                        - Sign out
//!
//! # Dashboard pages (login required)
//! GET  /admin                         - Stats and charts
//! GET  /admin/local-users             - Users table (client-side paging)
//! POST /admin/local-users             - Add user
//! POST /admin/local-users/{id}        - Update user
//! POST /admin/local-users/{id}/delete - Delete user (undo available)
//! POST /admin/local-users/undo        - Restore last deleted user
//! GET  /admin/api-products            - Products table (server-side paging)
//! POST /admin/api-products            - Add product
//! POST /admin/api-products/{id}       - Update product
//! POST /admin/api-products/{id}/delete - Delete product
//! POST /admin/api-products/populate   - Import demo products (admin only)
//! GET  /admin/api-users               - Demo API users (read-only)
//! GET  /admin/profile                 - Profile
//! POST /admin/profile                 - Update name/photo
//! POST /admin/profile/password        - Change password
//!
//! # JSON API
//! /api/auth/*, /api/users*, /api/products*, /api/upload/image, /api/stats
//! ```

pub mod api;
pub mod auth;
pub mod dashboard;
pub mod demo_users;
pub mod products;
pub mod profile;
pub mod users;

use axum::{
    Router,
    extract::State,
    handler::Handler,
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use backoffice_core::FieldErrors;

use crate::middleware::{auth::HOME_PATH, auth_rate_limiter, set_flash, take_flash};
use crate::models::{CurrentAccount, Flash};
use crate::state::AppState;

// =============================================================================
// Page chrome
// =============================================================================

/// A sidebar entry.
#[derive(Debug, Clone, Copy)]
pub struct NavItem {
    pub key: &'static str,
    pub label: &'static str,
    pub href: &'static str,
    pub icon: &'static str,
}

/// Sidebar entries in display order.
pub const NAV_ITEMS: [NavItem; 5] = [
    NavItem {
        key: "dashboard",
        label: "Dashboard",
        href: "/admin",
        icon: "ph-squares-four",
    },
    NavItem {
        key: "products",
        label: "API Products",
        href: "/admin/api-products",
        icon: "ph-package",
    },
    NavItem {
        key: "users",
        label: "Local Users",
        href: "/admin/local-users",
        icon: "ph-users",
    },
    NavItem {
        key: "api-users",
        label: "API Users",
        href: "/admin/api-users",
        icon: "ph-cloud",
    },
    NavItem {
        key: "profile",
        label: "Profile",
        href: "/admin/profile",
        icon: "ph-user-circle",
    },
];

/// Layout data shared by every page behind login.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub account: CurrentAccount,
    pub flash: Option<Flash>,
    pub active: &'static str,
    pub nav: &'static [NavItem],
    /// Interval of the browser-side session check.
    pub auth_poll_ms: u64,
    /// How long the undo toast stays up.
    pub undo_window_ms: i64,
}

impl PageContext {
    /// Build the context, consuming any pending flash message.
    pub async fn load(
        state: &AppState,
        session: &Session,
        account: CurrentAccount,
        active: &'static str,
    ) -> Self {
        let dashboard = &state.config().dashboard;
        Self {
            account,
            flash: take_flash(session).await,
            active,
            nav: &NAV_ITEMS,
            auth_poll_ms: dashboard.auth_poll_seconds.saturating_mul(1000),
            undo_window_ms: dashboard.undo_window_seconds.saturating_mul(1000),
        }
    }

    #[must_use]
    pub fn is_active(&self, key: &str) -> bool {
        self.active == key
    }

    /// Title of the active page for the header.
    #[must_use]
    pub fn page_title(&self) -> &'static str {
        self.nav
            .iter()
            .find(|n| n.key == self.active)
            .map_or("Dashboard", |n| n.label)
    }
}

/// Where to send the browser after a form action.
///
/// Only local paths under `base` are accepted, so a crafted `return_to` cannot
/// redirect off-site.
#[must_use]
pub fn return_path(return_to: Option<&str>, base: &str) -> String {
    return_to
        .map(str::trim)
        .filter(|p| p.starts_with(base) && !p.starts_with("//") && !p.contains("://"))
        .map_or_else(|| base.to_string(), String::from)
}

/// Decoded query pairs of a local path such as `/admin/local-users?page=2`.
#[must_use]
pub fn path_query_pairs(path: &str) -> Vec<(String, String)> {
    path.split_once('?')
        .map(|(_, qs)| {
            url::form_urlencoded::parse(qs.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default()
}

/// First value of `key` in raw query pairs.
#[must_use]
pub fn query_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Queue a toast for the next page and redirect there (PRG).
pub async fn flash_redirect(session: &Session, flash: Flash, to: &str) -> Redirect {
    if let Err(e) = set_flash(session, flash).await {
        tracing::warn!(error = %e, "Failed to store flash message");
    }
    Redirect::to(to)
}

/// An add/edit dialog rendered open on top of a table page.
#[derive(Debug, Clone)]
pub struct FormDialog<F> {
    pub title: &'static str,
    pub submit_label: &'static str,
    /// Form `action` URL.
    pub action: String,
    pub form: F,
    pub errors: FieldErrors,
    /// Page to go back to; also posted as `return_to`.
    pub return_to: String,
}

impl<F> FormDialog<F> {
    /// Dialog that posts to the collection (create).
    pub fn add(title: &'static str, base: &str, form: F, return_to: &str) -> Self {
        Self {
            title,
            submit_label: "Add",
            action: base.to_string(),
            form,
            errors: FieldErrors::new(),
            return_to: return_to.to_string(),
        }
    }

    /// Dialog that posts to a row (update).
    pub fn edit(title: &'static str, base: &str, id: i32, form: F, return_to: &str) -> Self {
        Self {
            title,
            submit_label: "Save changes",
            action: format!("{base}/{id}"),
            form,
            errors: FieldErrors::new(),
            return_to: return_to.to_string(),
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = errors;
        self
    }
}

// =============================================================================
// Router
// =============================================================================

/// Session-backed auth pages (login/register share one rate limiter).
fn auth_routes(trust_proxy: bool) -> Router<AppState> {
    let limiter = auth_rate_limiter(trust_proxy);
    Router::new()
        .route("/", get(|| async { Redirect::to(HOME_PATH) }))
        .route(
            "/login",
            get(auth::login_page).post(auth::login.layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).post(auth::register.layer(limiter)),
        )
        .route("/logout", post(auth::logout))
}

/// Server-rendered dashboard pages.
fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(dashboard::index))
        .route("/admin/local-users", get(users::index).post(users::create))
        .route("/admin/local-users/undo", post(users::undo))
        .route("/admin/local-users/{id}", post(users::update))
        .route("/admin/local-users/{id}/delete", post(users::delete))
        .route(
            "/admin/api-products",
            get(products::index).post(products::create),
        )
        .route("/admin/api-products/populate", post(products::populate))
        .route("/admin/api-products/{id}", post(products::update))
        .route("/admin/api-products/{id}/delete", post(products::delete))
        .route("/admin/api-users", get(demo_users::index))
        .route("/admin/profile", get(profile::index).post(profile::update))
        .route("/admin/profile/password", post(profile::change_password))
}

/// All application routes.
///
/// Set `trust_proxy` only when a reverse proxy overwrites `X-Forwarded-For`.
pub fn routes(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth_routes(trust_proxy))
        .merge(page_routes())
        .merge(api::router(trust_proxy))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_path_stays_local() {
        let base = "/admin/local-users";
        assert_eq!(
            return_path(Some("/admin/local-users?page=2"), base),
            "/admin/local-users?page=2"
        );
        assert_eq!(return_path(None, base), base);
        assert_eq!(return_path(Some("https://evil.test/admin/local-users"), base), base);
        assert_eq!(return_path(Some("//evil.test"), base), base);
        assert_eq!(return_path(Some("/admin/profile"), base), base);
    }

    #[test]
    fn test_path_query_pairs_decodes() {
        let pairs = path_query_pairs("/admin/local-users?q=jane%20doe&page=2&edit=5");
        assert_eq!(query_value(&pairs, "q"), Some("jane doe"));
        assert_eq!(query_value(&pairs, "page"), Some("2"));
        assert_eq!(query_value(&pairs, "edit"), Some("5"));
        assert_eq!(query_value(&pairs, "dialog"), None);
        assert!(path_query_pairs("/admin/local-users").is_empty());
    }

    #[test]
    fn test_form_dialog_actions() {
        let add = FormDialog::add("Add User", "/admin/local-users", (), "/admin/local-users");
        assert_eq!(add.action, "/admin/local-users");
        let edit = FormDialog::edit("Edit User", "/admin/local-users", 7, (), "/admin/local-users");
        assert_eq!(edit.action, "/admin/local-users/7");
        assert_eq!(edit.submit_label, "Save changes");
    }

    #[test]
    fn test_nav_keys_are_unique() {
        let mut keys: Vec<&str> = NAV_ITEMS.iter().map(|n| n.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), NAV_ITEMS.len());
    }
}
