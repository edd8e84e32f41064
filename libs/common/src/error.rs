//! Infrastructure error types shared by the services
//!
//! Domain errors live in the service crates; this type only covers the
//! plumbing that `common` owns (database pool, settings).

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Error raised while setting up or talking to shared infrastructure
#[derive(Error, Debug)]
pub enum InfraError {
    /// Error occurred while opening a database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<config::ConfigError> for InfraError {
    fn from(err: config::ConfigError) -> Self {
        InfraError::Configuration(err.to_string())
    }
}

/// Type alias for Result with InfraError
pub type InfraResult<T> = Result<T, InfraError>;
