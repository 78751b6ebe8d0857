use axum::http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Default bcrypt cost factor (2^12 iterations, roughly 200-300ms per hash).
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Lowest accepted bcrypt cost. Anything cheaper is too easy to brute force offline.
pub const MIN_BCRYPT_COST: u32 = 12;

/// Highest accepted bcrypt cost. Above this, login latency becomes excessive.
pub const MAX_BCRYPT_COST: u32 = 14;

/// Default token lifetime: 1 hour.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 3600;

pub const MIN_TOKEN_TTL_SECONDS: i64 = 60;

pub const MAX_TOKEN_TTL_SECONDS: i64 = 86_400;

/// Default tolerance for `iat` claims in the future (5 minutes).
pub const DEFAULT_JWT_CLOCK_SKEW_SECONDS: i64 = 300;

pub const MAX_JWT_CLOCK_SKEW_SECONDS: i64 = 600;

/// HS256 secrets shorter than the hash output weaken the MAC.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub jwt_secret: SecretString,
    pub token_ttl_seconds: i64,
    pub bcrypt_cost: u32,
    pub jwt_clock_skew_seconds: i64,
    /// Parsed at load time; an unparsable origin fails startup.
    pub cors_allowed_origin: Option<HeaderValue>,
    pub db_max_connections: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT secret: {0}")]
    InvalidJwtSecret(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:4000".to_string());

        let jwt_secret = vars
            .get("AUTH_JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_JWT_SECRET".to_string()))?;

        if jwt_secret.len() < MIN_JWT_SECRET_BYTES {
            // Never echo the secret itself.
            return Err(ConfigError::InvalidJwtSecret(format!(
                "Expected at least {} bytes, got {}",
                MIN_JWT_SECRET_BYTES,
                jwt_secret.len()
            )));
        }
        let jwt_secret = SecretString::from(jwt_secret.clone());

        let token_ttl_seconds = parse_in_range(
            vars,
            "AUTH_TOKEN_TTL_SECONDS",
            DEFAULT_TOKEN_TTL_SECONDS,
            MIN_TOKEN_TTL_SECONDS..=MAX_TOKEN_TTL_SECONDS,
        )?;

        let bcrypt_cost = parse_in_range(
            vars,
            "AUTH_BCRYPT_COST",
            DEFAULT_BCRYPT_COST,
            MIN_BCRYPT_COST..=MAX_BCRYPT_COST,
        )?;

        let jwt_clock_skew_seconds = parse_in_range(
            vars,
            "AUTH_JWT_CLOCK_SKEW_SECONDS",
            DEFAULT_JWT_CLOCK_SKEW_SECONDS,
            0..=MAX_JWT_CLOCK_SKEW_SECONDS,
        )?;

        let cors_allowed_origin = vars
            .get("CORS_ALLOWED_ORIGIN")
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidValue {
                    name: "CORS_ALLOWED_ORIGIN".to_string(),
                    reason: "not a valid header value".to_string(),
                })
            })
            .transpose()?;

        let db_max_connections = parse_in_range(
            vars,
            "DB_MAX_CONNECTIONS",
            DEFAULT_DB_MAX_CONNECTIONS,
            1..=u32::MAX,
        )?;

        Ok(Config {
            database_url,
            bind_address,
            jwt_secret,
            token_ttl_seconds,
            bcrypt_cost,
            jwt_clock_skew_seconds,
            cors_allowed_origin,
            db_max_connections,
        })
    }

    /// Raw bytes of the signing secret, for building the token signer.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

fn parse_in_range<T>(
    vars: &HashMap<String, String>,
    name: &str,
    default: T,
    range: std::ops::RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display + Copy,
{
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };

    let value: T = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("'{}' is not a valid number", raw),
    })?;

    if !range.contains(&value) {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!(
                "{} is out of range ({}-{})",
                value,
                range.start(),
                range.end()
            ),
        });
    }

    Ok(value)
}
