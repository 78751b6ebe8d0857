//! Test server harness for E2E testing
//!
//! Provides TestAuthServer for spawning real credential service instances
//! in tests.

use crate::fixtures::test_config;
use crate::in_memory_store::InMemoryUserStore;
use anyhow::Context;
use auth_service::config::Config;
use auth_service::crypto::{PasswordHasher, TokenSigner};
use auth_service::handlers::auth_handler::AppState;
use auth_service::models::{PublicUser, TokenResponse};
use auth_service::repositories::{PgUserStore, UserStore};
use auth_service::routes;
use auth_service::services::CredentialService;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the credential service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_register_e2e() -> Result<()> {
///     let server = TestAuthServer::spawn().await?;
///
///     let response = server
///         .client()
///         .post(format!("{}/auth/register", server.url()))
///         .json(&json!({"email": "a@x.com", "password": "longenough1", "name": "A"}))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 201);
///     Ok(())
/// }
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    config: Config,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn a server backed by a fresh [`InMemoryUserStore`].
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_store(Arc::new(InMemoryUserStore::new())).await
    }

    /// Spawn a server over PostgreSQL (typically the pool from `#[sqlx::test]`).
    pub async fn spawn_with_pool(pool: PgPool) -> Result<Self, anyhow::Error> {
        Self::spawn_with_store(Arc::new(PgUserStore::new(pool))).await
    }

    /// Spawn a server over any store, with the default test configuration.
    pub async fn spawn_with_store(store: Arc<dyn UserStore>) -> Result<Self, anyhow::Error> {
        Self::spawn_with_config(store, test_config()).await
    }

    /// Spawn a server over any store and configuration.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Build the real router from `auth_service::routes`
    /// - Start the HTTP server in the background
    pub async fn spawn_with_config(
        store: Arc<dyn UserStore>,
        config: Config,
    ) -> Result<Self, anyhow::Error> {
        let hasher = PasswordHasher::new(config.bcrypt_cost)
            .map_err(|e| anyhow::anyhow!("Failed to build password hasher: {}", e))?;
        let signer = TokenSigner::new(
            config.jwt_secret_bytes(),
            config.token_ttl_seconds,
            config.jwt_clock_skew_seconds,
        );

        let state = Arc::new(AppState {
            credentials: CredentialService::new(store, hasher, signer),
        });

        // Only the first server in a test process can install the global
        // recorder; later ones get a standalone handle.
        let metrics_handle = match routes::init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => PrometheusBuilder::new().build_recorder().handle(),
        };

        let app = routes::build_routes(
            state,
            metrics_handle,
            config.cors_allowed_origin.clone(),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind test server")?;
        let addr = listener
            .local_addr()
            .context("Failed to get local address")?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }

    /// Base URL, e.g. `http://127.0.0.1:54321`
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// POST /auth/register with the given fields, returning the raw response.
    pub async fn post_register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .post(format!("{}/auth/register", self.url()))
            .json(&json!({ "email": email, "password": password, "name": name }))
            .send()
            .await?)
    }

    /// POST /auth/login with the given fields, returning the raw response.
    pub async fn post_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        Ok(self
            .client
            .post(format!("{}/auth/login", self.url()))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?)
    }

    /// Register a user and require 201.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<PublicUser, anyhow::Error> {
        let response = self.post_register(email, password, name).await?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::CREATED,
            "register returned {}",
            response.status()
        );
        Ok(response.json().await?)
    }

    /// Log in and require 200.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, anyhow::Error> {
        let response = self.post_login(email, password).await?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::OK,
            "login returned {}",
            response.status()
        );
        Ok(response.json().await?)
    }

    /// Log in and return only the access token.
    pub async fn login_token(&self, email: &str, password: &str) -> Result<String, anyhow::Error> {
        Ok(self.login(email, password).await?.access_token)
    }
}

impl Drop for TestAuthServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
