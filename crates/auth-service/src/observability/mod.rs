//! Observability for the auth service: metrics, log field hygiene and
//! subscriber setup.
//!
//! # Privacy by Default
//!
//! Instrumented functions use `#[instrument(skip_all)]` and add fields
//! explicitly. Fields fall into three groups:
//! - **SAFE**: can be logged in plaintext (outcomes, operation names)
//! - **HASHED**: logged only through [`hash_for_correlation`] (emails)
//! - **NEVER**: must never appear in logs (passwords, hashes, tokens, secret)

pub mod metrics;

use crate::errors::AuthError;
use sha2::{Digest, Sha256};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "auth_service=debug,tower_http=debug";

/// Install the process-wide tracing subscriber.
///
/// `RUST_LOG` overrides the default filter; `LOG_FORMAT=json` switches to
/// JSON lines for log shippers.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars)
///
/// Lets log lines about the same email be correlated without storing the
/// email. Not a secret-protection primitive.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest.get(..4).unwrap_or_default())
}

/// Error categories for metrics labels (bounded cardinality)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller sent something unusable (validation, duplicate)
    Client,
    /// Authentication failures (invalid credentials, invalid token)
    Authentication,
    /// Cryptographic errors (hashing, signing)
    Cryptographic,
    /// Storage and other internal errors
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Client => "client",
            ErrorCategory::Authentication => "authentication",
            ErrorCategory::Cryptographic => "cryptographic",
            ErrorCategory::Internal => "internal",
        }
    }
}

impl From<&AuthError> for ErrorCategory {
    fn from(err: &AuthError) -> Self {
        match err {
            AuthError::Validation { .. } | AuthError::DuplicateKey => ErrorCategory::Client,
            AuthError::InvalidCredentials | AuthError::NotFound | AuthError::InvalidToken(_) => {
                ErrorCategory::Authentication
            }
            AuthError::Crypto(_) => ErrorCategory::Cryptographic,
            AuthError::StorageUnavailable(_) | AuthError::Internal => ErrorCategory::Internal,
        }
    }
}
