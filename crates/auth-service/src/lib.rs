//! Credential Service Library
//!
//! Email/password authentication with bearer token issuance.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Password hashing and token signing
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `models` - Data models and request validation
//! - `repositories` - User storage
//! - `services` - Credential verification and token issuance

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
