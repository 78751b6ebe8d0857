use crate::models::FieldError;
use crate::repositories::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned for every login failure. Never varies with the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    #[error("An account with this email already exists")]
    DuplicateKey,

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Store-level "no such record". Internal only: the credential service
    /// turns it into `InvalidCredentials` before it reaches a login caller.
    #[error("Record not found")]
    NotFound,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Internal server error")]
    Internal,
}

impl AuthError {
    /// Single-field validation failure.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        AuthError::Validation {
            message: message.clone(),
            details: vec![FieldError {
                field: field.to_string(),
                message,
            }],
        }
    }

    /// HTTP status for this error. Response rendering and error metrics
    /// both read it from here.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::Validation { .. } => StatusCode::BAD_REQUEST,
            AuthError::DuplicateKey => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::NotFound | AuthError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Crypto(_) | AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey => AuthError::DuplicateKey,
            StoreError::NotFound => AuthError::NotFound,
            StoreError::Unavailable(msg) => AuthError::StorageUnavailable(msg),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message, details) = match self {
            AuthError::Validation { message, details } => {
                ("VALIDATION_ERROR", message, Some(details))
            }
            AuthError::DuplicateKey => (
                "DUPLICATE_EMAIL",
                "An account with this email already exists".to_string(),
                None,
            ),
            // NotFound should never get this far; if it does, it must look
            // exactly like a credential failure.
            AuthError::InvalidCredentials | AuthError::NotFound => (
                "INVALID_CREDENTIALS",
                INVALID_CREDENTIALS_MESSAGE.to_string(),
                None,
            ),
            AuthError::StorageUnavailable(reason) => {
                tracing::error!(target: "auth.errors", reason = %reason, "Storage unavailable");
                (
                    "STORAGE_UNAVAILABLE",
                    "The service is temporarily unavailable. Please try again later.".to_string(),
                    None,
                )
            }
            AuthError::InvalidToken(_) => (
                "INVALID_TOKEN",
                "The access token is invalid or expired".to_string(),
                None,
            ),
            AuthError::Crypto(reason) => {
                tracing::error!(target: "auth.errors", reason = %reason, "Cryptographic failure");
                (
                    "CRYPTO_ERROR",
                    "An internal cryptographic error occurred".to_string(),
                    None,
                )
            }
            AuthError::Internal => (
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        };

        let body = ErrorResponse {
            code,
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}
