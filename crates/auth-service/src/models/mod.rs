use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum password length, counted in characters after trimming.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Upper bounds keep request bodies sane and match the column widths.
pub const MAX_EMAIL_LENGTH: usize = 255;
pub const MAX_NAME_LENGTH: usize = 255;

/// bcrypt only looks at the first 72 bytes of its input; longer passwords are
/// rejected rather than silently truncated.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// User model (maps to users table).
///
/// Holds the password hash, so it never leaves the service layer; callers
/// only ever see [`PublicUser`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Data needed to insert a user. `user_id` and `created_at` come from the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
}

/// Non-secret projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser {
            id: user.user_id,
            email: user.email,
            name: user.display_name,
            created_at: user.created_at,
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// POST /auth/register body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: SecretString,
    pub name: String,
}

impl RegisterRequest {
    /// Check the body's shape before any work is done.
    ///
    /// Collects every problem rather than stopping at the first, so the
    /// caller can fix the whole form in one round trip.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(field_error("email", "Email is required"));
        } else if email.len() > MAX_EMAIL_LENGTH || !is_valid_email(email) {
            errors.push(field_error("email", "Email must be a valid email address"));
        }

        let password = self.password.expose_secret().trim();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.push(field_error(
                "password",
                format!(
                    "Password must be at least {} characters",
                    MIN_PASSWORD_LENGTH
                ),
            ));
        } else if password.len() > MAX_PASSWORD_BYTES {
            errors.push(field_error(
                "password",
                format!("Password must be at most {} bytes", MAX_PASSWORD_BYTES),
            ));
        }

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(field_error("name", "Name is required"));
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(field_error(
                "name",
                format!("Name must be at most {} characters", MAX_NAME_LENGTH),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// POST /auth/login body.
///
/// Deliberately has no `validate()`: any malformed login is just a failed
/// login, reported as invalid credentials.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

fn field_error(field: &str, message: impl Into<String>) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Simple email validation.
///
/// Checks for basic email format: something@something.something
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // Domain must have at least one dot and no empty labels
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
