//! Black-box tests against a running Backoffice server.
//!
//! # Running Tests
//!
//! ```bash
//! bo-cli migrate
//! ADMIN_TRUST_PROXY=true cargo run -p backoffice-admin &
//! cargo test -p backoffice-integration-tests -- --ignored
//! ```
//!
//! `BACKOFFICE_URL` overrides the default `http://localhost:3001`. The
//! server must trust proxy headers, otherwise every client shares one login
//! rate limit bucket.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, redirect};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every throwaway account.
pub const TEST_PASSWORD: &str = "integration-pass-42";

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("BACKOFFICE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Absolute URL for `path`.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A random private address, so each client gets its own login rate limit
/// bucket (the limiter keys on `x-forwarded-for` behind a trusted proxy).
fn forwarded_ip() -> String {
    let b = Uuid::new_v4().into_bytes();
    format!("10.{}.{}.{}", b[0], b[1], b[2])
}

/// A client that keeps cookies and does not follow redirects, so tests can
/// assert on `Location`.
#[must_use]
pub fn client() -> Client {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&forwarded_ip()).expect("IPv4 text is a valid header"),
    );

    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique address so reruns never collide.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@backoffice.test", Uuid::new_v4().simple())
}

/// Register a fresh account through the API and sign it in.
///
/// Returns the logged-in client and the account's email.
pub async fn logged_in_client() -> (Client, String) {
    let client = client();
    let email = unique_email("it");

    let resp = client
        .post(url("/api/auth/register"))
        .json(&json!({
            "name": "Integration Tester",
            "email": email,
            "password": TEST_PASSWORD,
        }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(url("/api/auth/login"))
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    (client, email)
}

/// Read a JSON body.
pub async fn json_body(resp: reqwest::Response) -> Value {
    resp.json().await.expect("response was not JSON")
}
