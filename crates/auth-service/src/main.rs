use auth_service::config::Config;
use auth_service::crypto::{PasswordHasher, TokenSigner};
use auth_service::handlers::auth_handler::AppState;
use auth_service::observability;
use auth_service::repositories::PgUserStore;
use auth_service::routes;
use auth_service::services::CredentialService;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_tracing();

    info!("Starting Credential Service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    // Initialize database connection pool
    info!("Connecting to database...");
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })?;

    info!("Database connection established");

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to run migrations: {}", e);
            e
        })?;

    info!("Migrations applied");

    // One bcrypt hash happens here to build the dummy hash
    let hasher = PasswordHasher::new(config.bcrypt_cost).map_err(|e| {
        error!("Failed to initialize password hasher: {}", e);
        e
    })?;

    let signer = TokenSigner::new(
        config.jwt_secret_bytes(),
        config.token_ttl_seconds,
        config.jwt_clock_skew_seconds,
    );

    let credentials =
        CredentialService::new(Arc::new(PgUserStore::new(db_pool)), hasher, signer);

    let state = Arc::new(AppState { credentials });

    let metrics_handle = routes::init_metrics_recorder().map_err(|e| {
        error!("Failed to install metrics recorder: {}", e);
        e
    })?;

    let app = routes::build_routes(
        state,
        metrics_handle,
        config.cors_allowed_origin.clone(),
    );

    // Parse bind address
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Credential Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Credential Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
