//! PostgreSQL-backed user store.

use super::{StoreError, UserStore};
use crate::models::{NewUser, User};
use crate::observability::metrics::record_db_query;
use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Instant;

/// Name of the unique constraint on `users.email` (see migrations).
const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_unique";

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let start = Instant::now();

        // Bound as a parameter: the email is compared as a literal, so no
        // input can change the shape of the query.
        let result = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, display_name, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;

        record_db_query("select", status_of(&result), start.elapsed());

        result.map_err(|e| map_sqlx_error(e, "fetch user by email"))
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let start = Instant::now();

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, display_name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING user_id, email, display_name, password_hash, created_at
            "#,
        )
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await;

        record_db_query("insert", status_of(&result), start.elapsed());

        result.map_err(|e| map_sqlx_error(e, "create user"))
    }
}

fn status_of<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    if result.is_ok() {
        "success"
    } else {
        "error"
    }
}

fn map_sqlx_error(err: sqlx::Error, operation: &str) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation()
                || db_err.constraint() == Some(EMAIL_UNIQUE_CONSTRAINT) =>
        {
            StoreError::DuplicateKey
        }
        other => {
            tracing::error!(target: "auth.repositories.users", error = %other, "Failed to {}", operation);
            StoreError::Unavailable(format!("Failed to {}: {}", operation, other))
        }
    }
}
