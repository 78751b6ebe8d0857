//! Integration tests for POST /auth/register

use auth_test_utils::{InMemoryUserStore, TestAuthServer};
use reqwest::StatusCode;
use std::sync::Arc;

#[tokio::test]
async fn test_register_returns_created_user_without_password() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server.post_register("a@x.com", "longenough1", "A").await?;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["email"].as_str(), Some("a@x.com"));
    assert_eq!(body["name"].as_str(), Some("A"));
    assert!(body["id"].as_str().is_some(), "User id should be present");
    assert!(body["created_at"].as_str().is_some());

    let obj = body.as_object().expect("body should be an object");
    assert!(!obj.contains_key("password"), "Password must never be returned");
    assert!(!obj.contains_key("password_hash"), "Hash must never be returned");

    Ok(())
}

#[tokio::test]
async fn test_register_stores_bcrypt_hash_not_plaintext() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryUserStore::new());
    let server = TestAuthServer::spawn_with_store(store.clone()).await?;

    server.register("a@x.com", "longenough1", "A").await?;

    let stored = store.get("a@x.com").expect("user should be stored");
    assert_ne!(stored.password_hash, "longenough1");
    assert!(
        stored.password_hash.starts_with("$2b$12$"),
        "Expected bcrypt cost 12 hash, got prefix {}",
        stored.password_hash.get(..7).unwrap_or_default()
    );

    Ok(())
}

#[tokio::test]
async fn test_register_trims_inputs() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryUserStore::new());
    let server = TestAuthServer::spawn_with_store(store.clone()).await?;

    let user = server
        .register("  a@x.com  ", "longenough1", "  A  ")
        .await?;

    assert_eq!(user.email, "a@x.com");
    assert_eq!(user.name, "A");
    assert!(store.get("a@x.com").is_some());

    Ok(())
}

#[tokio::test]
async fn test_register_duplicate_email_returns_conflict() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.register("a@x.com", "longenough1", "A").await?;

    let response = server.post_register("a@x.com", "different-pass", "B").await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["code"].as_str(), Some("DUPLICATE_EMAIL"));

    Ok(())
}

#[tokio::test]
async fn test_register_validation_reports_every_field() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryUserStore::new());
    let server = TestAuthServer::spawn_with_store(store.clone()).await?;

    let response = server.post_register("not-an-email", "short", "").await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["code"].as_str(), Some("VALIDATION_ERROR"));

    let fields: Vec<&str> = body["details"]
        .as_array()
        .expect("details should be an array")
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"email"), "fields: {:?}", fields);
    assert!(fields.contains(&"password"), "fields: {:?}", fields);
    assert!(fields.contains(&"name"), "fields: {:?}", fields);

    assert!(store.is_empty(), "Nothing is stored on validation failure");
    Ok(())
}

#[tokio::test]
async fn test_register_password_of_exactly_eight_chars_accepted() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server.post_register("a@x.com", "12345678", "A").await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = server.post_register("b@x.com", "1234567", "B").await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn test_register_malformed_json_returns_bad_request() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/auth/register", server.url()))
        .header("content-type", "application/json")
        .body("{\"email\": ")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["code"].as_str(), Some("VALIDATION_ERROR"));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_registrations_single_winner() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryUserStore::new());
    let server = Arc::new(TestAuthServer::spawn_with_store(store.clone()).await?);

    let tasks: Vec<_> = (0..5)
        .map(|i| {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                server
                    .post_register("race@x.com", "longenough1", &format!("Racer {}", i))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await??.status() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("Unexpected status {}", other),
        }
    }

    assert_eq!(created, 1, "Exactly one registration should win");
    assert_eq!(conflicts, 4);
    assert_eq!(store.len(), 1);
    Ok(())
}
