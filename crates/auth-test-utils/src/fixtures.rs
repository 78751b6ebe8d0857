//! Deterministic configuration fixtures for testing
//!
//! Every test server shares the same signing secret so tests can decode
//! and verify the tokens they receive.

use auth_service::config::{
    Config, DEFAULT_BCRYPT_COST, DEFAULT_DB_MAX_CONNECTIONS, DEFAULT_JWT_CLOCK_SKEW_SECONDS,
    DEFAULT_TOKEN_TTL_SECONDS,
};
use auth_service::crypto::TokenSigner;
use secrecy::SecretString;

/// HS256 secret used by every test server (exactly 32 bytes).
pub const TEST_JWT_SECRET: &str = "test-secret-0123456789abcdefghij";

/// A different secret, for "signed by someone else" checks.
pub const OTHER_JWT_SECRET: &str = "other-secret-0123456789abcdefghi";

/// Token TTL used by test servers.
pub const TEST_TOKEN_TTL_SECONDS: i64 = DEFAULT_TOKEN_TTL_SECONDS;

/// Configuration for an in-process test server.
///
/// Bcrypt stays at the production default so timing behaviour matches.
pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        bind_address: "127.0.0.1:0".to_string(),
        jwt_secret: SecretString::from(TEST_JWT_SECRET),
        token_ttl_seconds: TEST_TOKEN_TTL_SECONDS,
        bcrypt_cost: DEFAULT_BCRYPT_COST,
        jwt_clock_skew_seconds: DEFAULT_JWT_CLOCK_SKEW_SECONDS,
        cors_allowed_origin: None,
        db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
    }
}

/// Signer matching the one built from [`test_config`].
pub fn test_signer() -> TokenSigner {
    TokenSigner::new(
        TEST_JWT_SECRET.as_bytes(),
        TEST_TOKEN_TTL_SECONDS,
        DEFAULT_JWT_CLOCK_SKEW_SECONDS,
    )
}
