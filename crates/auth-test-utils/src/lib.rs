//! # Auth Test Utilities
//!
//! Shared test utilities for the credential service.
//!
//! This crate provides:
//! - Fixed test configuration (secret, TTL, bcrypt cost)
//! - An in-memory `UserStore` with the same uniqueness contract as Postgres
//! - Server test harness (`TestAuthServer` for E2E tests)
//! - Custom assertions (`TokenAssertions` trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestAuthServer::spawn().await?;
//!     server.register("a@x.com", "longenough1", "A").await?;
//!
//!     let token = server.login_token("a@x.com", "longenough1").await?;
//!     token
//!         .assert_valid_jwt()
//!         .assert_for_email("a@x.com")
//!         .assert_verifies_with(TEST_JWT_SECRET);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod in_memory_store;
pub mod server_harness;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
pub use in_memory_store::*;
pub use server_harness::*;
