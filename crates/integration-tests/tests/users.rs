//! Directory users API, including delete and restore.

#![allow(clippy::unwrap_used)]

use backoffice_integration_tests::{json_body, logged_in_client, unique_email, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

fn user_body(email: &str) -> Value {
    json!({
        "firstName": "Emily",
        "lastName": "Johnson",
        "age": 28,
        "gender": "female",
        "email": email,
        "phone": "+81 965-431-3024",
        "dateOfBirth": "1996-05-30",
    })
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_user_crud_and_restore() {
    let (client, _) = logged_in_client().await;
    let email = unique_email("user");

    let resp = client
        .post(url("/api/users"))
        .json(&user_body(&email))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["firstName"], "Emily");

    let mut changed = user_body(&email);
    changed["firstName"] = json!("Emma");
    let resp = client
        .put(url(&format!("/api/users/{id}")))
        .json(&changed)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["firstName"], "Emma");

    let resp = client
        .delete(url(&format!("/api/users/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let deleted = json_body(resp).await;

    let resp = client
        .get(url(&format!("/api/users/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .post(url("/api/users/restore"))
        .json(&deleted)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_body(resp).await["id"].as_i64(), Some(id));

    client
        .delete(url(&format!("/api/users/{id}")))
        .send()
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_invalid_user_returns_field_errors() {
    let (client, _) = logged_in_client().await;

    let resp = client
        .post(url("/api/users"))
        .json(&json!({ "firstName": "", "email": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(resp).await;
    assert_eq!(body["errors"]["firstName"], "First name is required");
    assert_eq!(body["errors"]["email"], "Invalid email address");
}
