//! Integration tests for POST /auth/login

use auth_test_utils::{
    TestAuthServer, TokenAssertions, OTHER_JWT_SECRET, TEST_JWT_SECRET, TEST_TOKEN_TTL_SECONDS,
};
use reqwest::StatusCode;

#[tokio::test]
async fn test_login_returns_bearer_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let user = server.register("a@x.com", "longenough1", "A").await?;

    let token = server.login("a@x.com", "longenough1").await?;

    assert_eq!(token.token_type, "Bearer");
    assert_eq!(token.expires_in, TEST_TOKEN_TTL_SECONDS as u64);
    token
        .access_token
        .assert_valid_jwt()
        .assert_for_email("a@x.com")
        .assert_for_subject(&user.id.to_string())
        .assert_expires_in(TEST_TOKEN_TTL_SECONDS)
        .assert_verifies_with(TEST_JWT_SECRET)
        .assert_rejected_by(OTHER_JWT_SECRET);

    Ok(())
}

#[tokio::test]
async fn test_login_trims_email() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.register("a@x.com", "longenough1", "A").await?;

    let token = server.login_token("  a@x.com ", "longenough1").await?;
    token.assert_for_email("a@x.com");

    Ok(())
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_are_indistinguishable(
) -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.register("a@x.com", "longenough1", "A").await?;

    let wrong_password = server.post_login("a@x.com", "wrong").await?;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password: serde_json::Value = wrong_password.json().await?;

    let unknown_email = server.post_login("nobody@x.com", "longenough1").await?;
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);
    let unknown_email: serde_json::Value = unknown_email.json().await?;

    assert_eq!(wrong_password["message"].as_str(), Some("Invalid credentials"));
    assert_eq!(wrong_password["code"].as_str(), Some("INVALID_CREDENTIALS"));
    assert_eq!(wrong_password, unknown_email, "Bodies must be identical");

    Ok(())
}

#[tokio::test]
async fn test_login_email_match_is_exact() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.register("a@x.com", "longenough1", "A").await?;

    let response = server.post_login("A@X.COM", "longenough1").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = server.post_login("%@x.com", "longenough1").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_login_malformed_body_is_invalid_credentials() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server
        .client()
        .post(format!("{}/auth/login", server.url()))
        .json(&serde_json::json!({ "email": "a@x.com" }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["code"].as_str(), Some("INVALID_CREDENTIALS"));

    Ok(())
}

#[tokio::test]
async fn test_each_login_issues_a_fresh_token() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    server.register("a@x.com", "longenough1", "A").await?;

    let first = server.login_token("a@x.com", "longenough1").await?;
    first.assert_verifies_with(TEST_JWT_SECRET);

    // iat has second resolution
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let second = server.login_token("a@x.com", "longenough1").await?;
    second.assert_verifies_with(TEST_JWT_SECRET);

    assert_ne!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_login_rejects_password_longer_than_registered_prefix() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;
    let password = "p".repeat(72);
    server.register("a@x.com", &password, "A").await?;

    let response = server
        .post_login("a@x.com", &format!("{}DIFFERENT-SUFFIX", password))
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["code"].as_str(), Some("INVALID_CREDENTIALS"));

    server.login_token("a@x.com", &password).await?;
    Ok(())
}
