use crate::config::{MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::errors::AuthError;
use crate::observability::metrics::record_token_validation;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::instrument;

/// Maximum allowed JWT size in bytes (4KB).
///
/// Tokens larger than this are rejected before any parsing or signature
/// work. Our own tokens are well under 400 bytes.
pub const MAX_JWT_SIZE_BYTES: usize = 4096;

const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

/// Token claims.
///
/// `sub` and `email` identify the user and must not show up in logs, so
/// Debug redacts them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user UUID)
    pub sub: String,
    /// User's email address
    pub email: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("email", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .finish()
    }
}

// ============================================================================
// Password hashing
// ============================================================================

/// bcrypt hashing at a fixed, validated cost.
///
/// Also holds a dummy hash computed at the same cost. Verifying against it
/// when a user does not exist makes the unknown-email path pay the same
/// bcrypt price as the wrong-password path.
#[derive(Clone)]
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl PasswordHasher {
    /// Build a hasher. Runs one bcrypt hash to produce the dummy hash.
    pub fn new(cost: u32) -> Result<Self, AuthError> {
        validate_cost(cost)?;

        // Random input: nothing anyone could submit will ever match it.
        let filler = hex::encode(generate_random_bytes(32)?);
        let dummy_hash = hash_password(&filler, cost)?;

        Ok(Self { cost, dummy_hash })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash_password(password, self.cost)
    }

    /// Verify `password` against `hash`, or against the dummy hash when
    /// there is none. Returns `false` in the dummy case regardless of
    /// outcome.
    pub fn verify_or_dummy(&self, password: &str, hash: Option<&str>) -> Result<bool, AuthError> {
        match hash {
            Some(hash) => verify_password(password, hash),
            None => {
                let _ = verify_password(password, &self.dummy_hash)?;
                Ok(false)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn dummy_hash(&self) -> &str {
        &self.dummy_hash
    }
}

fn validate_cost(cost: u32) -> Result<(), AuthError> {
    if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(AuthError::Crypto(format!(
            "Invalid bcrypt cost: {} (must be {}-{})",
            cost, MIN_BCRYPT_COST, MAX_BCRYPT_COST
        )));
    }
    Ok(())
}

/// Hash a password with bcrypt using the given cost factor.
///
/// # Errors
///
/// Returns `AuthError::Crypto` if the cost is outside 12-14 or bcrypt fails.
#[instrument(skip_all)]
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    validate_cost(cost)?;

    bcrypt::hash(password, cost)
        .map_err(|e| AuthError::Crypto(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a bcrypt hash.
///
/// bcrypt's verify re-derives the hash with the stored salt and cost and
/// compares in constant time.
#[instrument(skip_all)]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AuthError::Crypto(format!("Password verification failed: {}", e)))
}

/// Cost factor encoded in a bcrypt hash (`$2b$12$...` -> 12).
pub fn bcrypt_cost_of(hash: &str) -> Option<u32> {
    hash.split('$').nth(2)?.parse().ok()
}

/// Generate cryptographically secure random bytes
pub fn generate_random_bytes(len: usize) -> Result<Vec<u8>, AuthError> {
    let rng = SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|e| AuthError::Crypto(format!("Random bytes generation failed: {}", e)))?;
    Ok(bytes)
}

// ============================================================================
// Token signing
// ============================================================================

/// Signs and verifies HS256 tokens with the process-wide secret.
///
/// Keys are derived once; the signer is immutable and shared across
/// requests without locking.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
    clock_skew_seconds: i64,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl_seconds", &self.ttl_seconds)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl_seconds: i64, clock_skew_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_seconds,
            clock_skew_seconds,
        }
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Build claims for `sub`/`email` issued at `now`, expiring one TTL later.
    pub fn claims_for(&self, sub: &str, email: &str, now: i64) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now + self.ttl_seconds,
        }
    }

    #[instrument(skip_all)]
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Crypto(format!("JWT signing operation failed: {}", e)))
    }

    /// Verify a token and extract its claims.
    ///
    /// Validates:
    /// - Token size (must be <= MAX_JWT_SIZE_BYTES)
    /// - Signature (HS256 only; other algorithms are rejected)
    /// - Expiration (`exp` claim, no leeway)
    /// - Issued-at time (`iat` claim) no further in the future than the clock skew
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "crypto",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            record_token_validation("error", Some("size"));
            return Err(AuthError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(target: "crypto", error = %e, "Token verification failed");
            record_token_validation("error", Some("signature_or_expiry"));
            AuthError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string())
        })?;

        // Reject tokens issued too far in the future (pre-generated tokens)
        let now = chrono::Utc::now().timestamp();
        let max_iat = now + self.clock_skew_seconds;

        if token_data.claims.iat > max_iat {
            tracing::debug!(
                target: "crypto",
                iat = token_data.claims.iat,
                now = now,
                max_allowed = max_iat,
                "Token rejected: iat too far in the future"
            );
            record_token_validation("error", Some("clock_skew"));
            return Err(AuthError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string()));
        }

        record_token_validation("success", None);
        Ok(token_data.claims)
    }
}
