//! Persistence layer.
//!
//! The credential service talks to storage only through [`UserStore`], so
//! the Postgres store can be swapped for an in-memory one in tests.

pub mod users;

use crate::models::{NewUser, User};
use async_trait::async_trait;
use thiserror::Error;

pub use users::PgUserStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A user with this email already exists.
    #[error("Duplicate key")]
    DuplicateKey,

    #[error("Not found")]
    NotFound,

    /// The backing store could not be reached or failed mid-operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Storage for user records, keyed by email.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Exact-match lookup. The email is a literal value, never a pattern.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Insert a new user.
    ///
    /// Must reject a duplicate email atomically with the insert; callers
    /// never check first.
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
}
