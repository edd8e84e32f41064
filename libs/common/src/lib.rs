//! Shared infrastructure for the marketplace services
//!
//! PostgreSQL pooling, Redis publish/subscribe, layered service settings and
//! the infrastructure error type used by both the `auth` and `marketplace`
//! services.

pub mod cache;
pub mod database;
pub mod error;
pub mod settings;
