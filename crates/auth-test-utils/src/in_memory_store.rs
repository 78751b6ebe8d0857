//! In-memory `UserStore` for E2E tests that should not need PostgreSQL.

use async_trait::async_trait;
use auth_service::models::{NewUser, User};
use auth_service::repositories::{StoreError, UserStore};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Users keyed by exact email.
///
/// The duplicate check and the insert happen under one lock, so concurrent
/// registrations of the same email behave like the unique constraint in
/// Postgres: exactly one wins.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
    unavailable: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw stored record, password hash included.
    pub fn get(&self, email: &str) -> Option<User> {
        self.users.lock().unwrap().get(email).cloned()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        self.check_available()?;
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.email) {
            return Err(StoreError::DuplicateKey);
        }
        let record = User {
            user_id: Uuid::new_v4(),
            email: user.email,
            display_name: user.display_name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(record.email.clone(), record.clone());
        Ok(record)
    }
}
