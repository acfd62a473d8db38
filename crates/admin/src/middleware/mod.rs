//! HTTP middleware stack for the dashboard.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//! 5. Rate limiting on login/register (governor)
//!
//! Authentication is enforced per handler by the extractors in [`auth`].

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAdmin, RequireAuth, clear_current_account, set_current_account,
};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::{create_session_layer, session_layer, set_flash, take_flash};
