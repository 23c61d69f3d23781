//! Storage error types for chron-log.

use thiserror::Error;

/// Errors from activity storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A SQL query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// A stored row or line holds data that cannot be decoded.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Reading or writing a store file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The configuration does not describe a usable store.
    #[error(transparent)]
    Config(#[from] chron_config::ConfigError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),
}
