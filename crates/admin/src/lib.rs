//! Backoffice admin dashboard library.
//!
//! Server-rendered pages for managing local users and API products, plus
//! the JSON API the pages' scripts and external clients use. The binary in
//! `main.rs` only wires configuration, logging and the listener around
//! [`app`]; everything else lives here so it can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use std::time::Duration;

use axum::Router;
use axum::http::{Request, Response};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Directory the stylesheet and scripts are served from, relative to the
/// workspace root.
pub const STATIC_DIR: &str = "crates/admin/static";

/// Build the full application router.
///
/// Layers, outermost first: Sentry, tracing, request id, sessions.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S>) -> Router
where
    S: SessionStore + Clone,
{
    let uploads = ServeDir::new(state.images().dir());
    let trust_proxy = state.config().trust_proxy;

    Router::new()
        .merge(routes::routes(trust_proxy))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .nest_service("/uploads", uploads)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::MemoryStore;

    use super::*;
    use crate::config::test_config;
    use crate::middleware::session_layer;

    /// Router over a lazy pool; only routes that never touch the database
    /// can be exercised.
    fn test_app() -> Router {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/backoffice_test")
            .unwrap();
        let layer = session_layer(MemoryStore::default(), &config);
        let state = AppState::new(config, pool).unwrap();
        app(state, layer)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }

    #[tokio::test]
    async fn test_root_redirects_to_dashboard() {
        let response = test_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/admin");
    }

    #[tokio::test]
    async fn test_dashboard_requires_login() {
        let response = test_app()
            .oneshot(Request::get("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn test_api_requires_login() {
        let response = test_app()
            .oneshot(Request::get("/api/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_login_page_renders() {
        let response = test_app()
            .oneshot(
                Request::get("/login?expired=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Session expired. Please login again."));
    }

    #[tokio::test]
    async fn test_api_body_rejection_is_json() {
        let peer: std::net::SocketAddr = "192.0.2.10:40000".parse().unwrap();
        let request = Request::post("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .extension(axum::extract::ConnectInfo(peer))
            .body(Body::from(r#"{"email": 5, "password": "x"}"#))
            .unwrap();

        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(body["message"].as_str().unwrap().contains("email"));
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
