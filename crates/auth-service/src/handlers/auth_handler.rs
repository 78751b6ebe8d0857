use crate::errors::AuthError;
use crate::models::{LoginRequest, PublicUser, RegisterRequest, TokenResponse};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::record_error;
use crate::observability::ErrorCategory;
use crate::services::CredentialService;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// Application state shared across handlers
pub struct AppState {
    pub credentials: CredentialService,
}

/// Handle user registration
///
/// POST /auth/register
pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublicUser>), AuthError> {
    let Json(payload) = payload.map_err(|rejection| {
        let err = AuthError::validation("body", rejection.body_text());
        record_handler_error("register", &err);
        err
    })?;

    tracing::info!(
        email_hash = %hash_for_correlation(payload.email.trim()),
        "Incoming registration request"
    );

    if let Err(details) = payload.validate() {
        let err = AuthError::Validation {
            message: "Request validation failed".to_string(),
            details,
        };
        record_handler_error("register", &err);
        return Err(err);
    }

    let user = state
        .credentials
        .register(&payload.email, &payload.password, &payload.name)
        .await
        .inspect_err(|err| record_handler_error("register", err))?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Handle user login
///
/// POST /auth/login
///
/// Any failure, including an unreadable body, is reported as invalid
/// credentials.
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AuthError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!(reason = %rejection.body_text(), "Unreadable login request");
        let err = AuthError::InvalidCredentials;
        record_handler_error("login", &err);
        err
    })?;

    tracing::info!(
        email_hash = %hash_for_correlation(payload.email.trim()),
        "Incoming login request"
    );

    let token = state
        .credentials
        .login(&payload.email, &payload.password)
        .await
        .inspect_err(|err| record_handler_error("login", err))?;

    Ok(Json(token))
}

fn record_handler_error(operation: &str, err: &AuthError) {
    record_error(
        operation,
        ErrorCategory::from(err).as_str(),
        err.status_code().as_u16(),
    );
}
