//! Integration tests for operational endpoints and response headers

use auth_test_utils::{test_config, InMemoryUserStore, TestAuthServer};
use axum::http::HeaderValue;
use reqwest::{Method, StatusCode};
use std::sync::Arc;

const ORIGIN: &str = "http://app.example.com";

#[tokio::test]
async fn test_health_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/health", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_served() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/metrics", server.url()))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_security_headers_on_every_response() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    for path in ["/health", "/does-not-exist"] {
        let response = server
            .client()
            .get(format!("{}{}", server.url(), path))
            .send()
            .await?;
        let headers = response.headers();

        assert_eq!(
            headers.get("x-content-type-options").and_then(|v| v.to_str().ok()),
            Some("nosniff"),
            "{}",
            path
        );
        assert_eq!(
            headers.get("x-frame-options").and_then(|v| v.to_str().ok()),
            Some("DENY"),
            "{}",
            path
        );
        assert!(headers.contains_key("strict-transport-security"), "{}", path);
        assert!(headers.contains_key("content-security-policy"), "{}", path);
        assert!(headers.contains_key("referrer-policy"), "{}", path);
    }

    Ok(())
}

#[tokio::test]
async fn test_error_responses_carry_security_headers() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server.post_login("nobody@x.com", "longenough1").await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("x-content-type-options"));
    Ok(())
}

#[tokio::test]
async fn test_cors_allows_configured_origin() -> Result<(), anyhow::Error> {
    let mut config = test_config();
    config.cors_allowed_origin = Some(HeaderValue::from_static(ORIGIN));
    let server =
        TestAuthServer::spawn_with_config(Arc::new(InMemoryUserStore::new()), config).await?;

    let response = server
        .client()
        .request(Method::OPTIONS, format!("{}/auth/login", server.url()))
        .header("origin", ORIGIN)
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await?;

    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some(ORIGIN)
    );
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-credentials")
            .and_then(|v| v.to_str().ok()),
        Some("true")
    );

    Ok(())
}

#[tokio::test]
async fn test_cors_ignores_other_origins() -> Result<(), anyhow::Error> {
    let mut config = test_config();
    config.cors_allowed_origin = Some(HeaderValue::from_static(ORIGIN));
    let server =
        TestAuthServer::spawn_with_config(Arc::new(InMemoryUserStore::new()), config).await?;

    let response = server
        .client()
        .get(format!("{}/health", server.url()))
        .header("origin", "http://evil.example.com")
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let allowed = response
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok());
    assert_ne!(allowed, Some("http://evil.example.com"));
    assert_ne!(allowed, Some("*"));
    Ok(())
}

#[tokio::test]
async fn test_no_cors_headers_without_configured_origin() -> Result<(), anyhow::Error> {
    let server = TestAuthServer::spawn().await?;

    let response = server
        .client()
        .get(format!("{}/health", server.url()))
        .header("origin", ORIGIN)
        .send()
        .await?;

    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));
    Ok(())
}
