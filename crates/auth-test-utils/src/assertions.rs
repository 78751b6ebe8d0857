//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for issued access tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// JWT header structure
#[derive(Debug, Deserialize)]
struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// JWT claims structure
#[derive(Debug, Deserialize)]
struct JwtClaims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

fn decode_part<T: for<'de> Deserialize<'de>>(token: &str, index: usize, what: &str) -> T {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no {} part", what));
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT {}: {}", what, e));
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("Failed to parse JWT {} JSON: {}", what, e))
}

fn claims(token: &str) -> JwtClaims {
    decode_part(token, 1, "payload")
}

/// Custom assertions for access tokens
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_for_email("a@x.com")
///     .assert_expires_in(3600)
///     .assert_verifies_with(TEST_JWT_SECRET);
/// ```
pub trait TokenAssertions {
    /// Assert that the token is a well-formed HS256 JWT
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert that the token was issued for the specified email
    fn assert_for_email(&self, email: &str) -> &Self;

    /// Assert that the token is for the specified subject (user id)
    fn assert_for_subject(&self, subject: &str) -> &Self;

    /// Assert that `exp - iat` equals the given lifetime
    fn assert_expires_in(&self, seconds: i64) -> &Self;

    /// Assert that the signature verifies under `secret`
    fn assert_verifies_with(&self, secret: &str) -> &Self;

    /// Assert that the signature does NOT verify under `secret`
    fn assert_rejected_by(&self, secret: &str) -> &Self;
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts
        );

        let header: JwtHeader = decode_part(self, 0, "header");
        assert_eq!(header.alg, "HS256", "Expected HS256 algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let claims = claims(self);
        assert!(!claims.sub.is_empty(), "JWT sub must not be empty");
        assert!(claims.exp > claims.iat, "JWT must expire after issue");
        self
    }

    fn assert_for_email(&self, email: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(claims.email, email, "Token issued for a different email");
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        let claims = claims(self);
        assert_eq!(claims.sub, subject, "Token subject mismatch");
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims = claims(self);
        assert_eq!(
            claims.exp - claims.iat,
            seconds,
            "Token lifetime mismatch (iat={}, exp={})",
            claims.iat,
            claims.exp
        );
        self
    }

    fn assert_verifies_with(&self, secret: &str) -> &Self {
        let result = decode::<serde_json::Value>(
            self,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );
        assert!(
            result.is_ok(),
            "Token should verify with the given secret: {:?}",
            result.err()
        );
        self
    }

    fn assert_rejected_by(&self, secret: &str) -> &Self {
        let result = decode::<serde_json::Value>(
            self,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err(), "Token unexpectedly verified with secret");
        self
    }
}
