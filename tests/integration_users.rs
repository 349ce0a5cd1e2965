#![allow(clippy::unwrap_used, clippy::missing_panics_doc, unreachable_pub)]
use reqwest::StatusCode;
use serde_json::json;

mod common;
use common::TestApp;

async fn create_user(app: &TestApp, email: &str) -> serde_json::Value {
    let resp = app
        .client
        .post(app.url("/api/users"))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User created successfully");
    body["user"].clone()
}

#[tokio::test]
async fn test_malformed_id_is_not_found() {
    let app = TestApp::spawn().await;

    for resp in [
        app.client.get(app.url("/api/users/not-a-uuid")).send().await.unwrap(),
        app.client.delete(app.url("/api/users/not-a-uuid")).send().await.unwrap(),
    ] {
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(TestApp::error_message(resp).await, "User not found");
    }
}

#[tokio::test]
async fn test_create_user_validation() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/users"))
        .json(&json!({ "email": "nope", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(TestApp::error_message(resp).await, "Invalid email address");

    let resp = app
        .client
        .put(app.url("/api/users/0190b5f0-7a3c-7d2e-9b1a-2f4c6d8e0a1b"))
        .json(&json!({ "email": "still-not-an-email" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let app = TestApp::spawn().await;

    let resp = app.client.get(app.url("/api/users")).send().await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(TestApp::error_message(resp).await, "Failed to retrieve users");
}

#[tokio::test]
async fn test_user_crud() {
    let app = TestApp::spawn_with_database().await;
    let email = common::unique_email("crud");

    let user = create_user(&app, &email).await;
    let id = user["id"].as_str().unwrap().to_string();
    assert_eq!(user["email_verified"], false);
    assert_eq!(user["is_active"], true);

    let resp = app.client.get(app.url(&format!("/api/users/{id}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let fetched: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(fetched["email"], email.as_str());

    let resp = app.client.get(app.url(&format!("/api/users/email/{email}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let by_email: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(by_email["id"], id.as_str());

    let new_email = common::unique_email("renamed");
    let resp = app
        .client
        .put(app.url(&format!("/api/users/{id}")))
        .json(&json!({ "email": new_email, "is_active": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User updated successfully");
    assert_eq!(body["user"]["email"], new_email.as_str());
    assert_eq!(body["user"]["is_active"], false);
    assert_ne!(body["user"]["updated_at"], user["updated_at"]);

    let resp = app.client.delete(app.url(&format!("/api/users/{id}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "User deleted successfully");

    let resp = app.client.delete(app.url(&format!("/api/users/{id}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app.client.get(app.url(&format!("/api/users/{id}"))).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = TestApp::spawn_with_database().await;
    let first = common::unique_email("dup-a");
    let second = common::unique_email("dup-b");
    create_user(&app, &first).await;
    let other = create_user(&app, &second).await;

    let resp = app
        .client
        .post(app.url("/api/users"))
        .json(&json!({ "email": first, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(TestApp::error_message(resp).await, "Email already exists");

    let resp = app
        .client
        .put(app.url(&format!("/api/users/{}", other["id"].as_str().unwrap())))
        .json(&json!({ "email": first }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(TestApp::error_message(resp).await, "Email already exists");
}

#[tokio::test]
async fn test_list_pagination() {
    let app = TestApp::spawn_with_database().await;
    for i in 0..3 {
        create_user(&app, &common::unique_email(&format!("page-{i}"))).await;
    }

    let resp = app.client.get(app.url("/api/users?page=1&limit=2")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 2);
    assert!(body["pagination"]["total"].as_i64().unwrap() >= 3);

    // Newest first.
    let users = body["users"].as_array().unwrap();
    assert!(users[0]["created_at"].as_str().unwrap() >= users[1]["created_at"].as_str().unwrap());

    // Out-of-range values fall back to the defaults.
    let resp = app.client.get(app.url("/api/users?page=0&limit=500")).send().await.unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 10);

    let resp = app.client.get(app.url("/api/users?page=abc")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.client.get(app.url("/api/users?page=9223372036854775807&limit=10")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["users"].as_array().unwrap().is_empty());
    assert_eq!(body["pagination"]["page"], i64::MAX);
    assert_eq!(body["pagination"]["limit"], 10);
}
