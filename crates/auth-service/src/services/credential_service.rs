//! Credential service: registration, credential validation and token
//! issuance.
//!
//! This is the only place passwords are hashed or compared and the only
//! place tokens are minted. It holds no mutable state.

use crate::crypto::{Claims, PasswordHasher, TokenSigner};
use crate::errors::AuthError;
use crate::models::{NewUser, PublicUser, TokenResponse, MAX_PASSWORD_BYTES, MIN_PASSWORD_LENGTH};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{
    record_bcrypt_duration, record_login_attempt, record_registration, record_token_issuance,
};
use crate::repositories::UserStore;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

pub struct CredentialService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    signer: TokenSigner,
}

impl CredentialService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, signer: TokenSigner) -> Self {
        Self {
            store,
            hasher,
            signer,
        }
    }

    /// Register a new user.
    ///
    /// # Steps
    ///
    /// 1. Reject passwords shorter than 8 characters (before any hashing)
    /// 2. Hash with bcrypt at the configured cost
    /// 3. Insert; the store rejects a taken email atomically
    ///
    /// Returns only the non-secret fields of the stored user.
    #[instrument(skip_all, fields(email_hash = %hash_for_correlation(email.trim())))]
    pub async fn register(
        &self,
        email: &str,
        password: &SecretString,
        name: &str,
    ) -> Result<PublicUser, AuthError> {
        let email = email.trim();
        let name = name.trim();
        let password = password.expose_secret().trim();

        if let Err(err) = check_password_policy(password) {
            record_registration("validation_error");
            return Err(err);
        }

        tracing::info!("Registering new user");

        let password_hash = self.hash_password(password).await?;

        let result = self
            .store
            .create(NewUser {
                email: email.to_string(),
                display_name: name.to_string(),
                password_hash,
            })
            .await;

        match result {
            Ok(user) => {
                record_registration("success");
                tracing::info!(user_id = %user.user_id, "User registered");
                Ok(PublicUser::from(user))
            }
            Err(err) => {
                let err = AuthError::from(err);
                match err {
                    AuthError::DuplicateKey => {
                        record_registration("duplicate");
                        tracing::info!("Registration rejected: email already registered");
                    }
                    _ => {
                        record_registration("error");
                        tracing::warn!(error = %err, "Registration failed");
                    }
                }
                Err(err)
            }
        }
    }

    /// Check an email/password pair.
    ///
    /// Both inputs lose surrounding whitespace only; nothing else is
    /// normalized. An unknown email and a wrong password produce the same
    /// error and both run one bcrypt verify at the configured cost.
    #[instrument(skip_all, fields(email_hash = %hash_for_correlation(email.trim())))]
    pub async fn validate_credentials(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<PublicUser, AuthError> {
        let email = email.trim();
        let password = password.expose_secret().trim();

        let user = match self.store.find_by_email(email).await {
            Ok(user) => user,
            // Store-level "missing" is indistinguishable from an absent row.
            Err(crate::repositories::StoreError::NotFound) => None,
            Err(err) => {
                record_login_attempt("error");
                let err = AuthError::from(err);
                tracing::warn!(error = %err, "Credential lookup failed");
                return Err(err);
            }
        };

        // bcrypt only sees the first 72 bytes, so a longer password could
        // match a stored hash it differs from. Such passwords never
        // registered; verify against the dummy hash and fail.
        let stored_hash = if password.len() > MAX_PASSWORD_BYTES {
            None
        } else {
            user.as_ref().map(|u| u.password_hash.clone())
        };
        let is_valid = match self.verify_password(password, stored_hash).await {
            Ok(valid) => valid,
            Err(err) => {
                record_login_attempt("error");
                return Err(err);
            }
        };

        match user {
            Some(user) if is_valid => {
                record_login_attempt("success");
                tracing::debug!(user_id = %user.user_id, "Credentials validated");
                Ok(PublicUser::from(user))
            }
            _ => {
                record_login_attempt("invalid_credentials");
                tracing::info!("Invalid credentials");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Mint a signed token for an authenticated user.
    ///
    /// The expiry is inside the signed payload, so verification needs
    /// nothing but the secret.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub fn issue_token(&self, user: &PublicUser) -> Result<TokenResponse, AuthError> {
        let start = Instant::now();
        let now = chrono::Utc::now().timestamp();
        let claims = self.signer.claims_for(&user.id.to_string(), &user.email, now);

        let token = match self.signer.sign(&claims) {
            Ok(token) => token,
            Err(err) => {
                record_token_issuance("error", start.elapsed());
                return Err(err);
            }
        };

        record_token_issuance("success", start.elapsed());
        tracing::info!("Issued access token");

        Ok(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: u64::try_from(self.signer.ttl_seconds()).unwrap_or(0),
        })
    }

    /// Validate credentials and issue a token in one step.
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<TokenResponse, AuthError> {
        let user = self.validate_credentials(email, password).await?;
        self.issue_token(&user)
    }

    /// Verify a token previously issued by [`Self::issue_token`].
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.signer.verify(token)
    }

    /// bcrypt is CPU-bound; run it on the blocking pool so concurrent
    /// requests each pay their own cost without stalling the runtime.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let password = SecretString::from(password.to_string());
        let start = Instant::now();

        let hash = tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret()))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Password hashing task failed");
                AuthError::Internal
            })??;

        record_bcrypt_duration("hash", start.elapsed());
        Ok(hash)
    }

    async fn verify_password(
        &self,
        password: &str,
        stored_hash: Option<String>,
    ) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let password = SecretString::from(password.to_string());
        let start = Instant::now();

        let valid = tokio::task::spawn_blocking(move || {
            hasher.verify_or_dummy(password.expose_secret(), stored_hash.as_deref())
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Password verification task failed");
            AuthError::Internal
        })??;

        record_bcrypt_duration("verify", start.elapsed());
        Ok(valid)
    }
}

fn check_password_policy(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::validation(
            "password",
            format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::validation(
            "password",
            format!("Password must be at most {} bytes", MAX_PASSWORD_BYTES),
        ));
    }
    Ok(())
}
