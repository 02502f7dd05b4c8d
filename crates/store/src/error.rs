//! Error types for storage operations.

use thiserror::Error;

/// Errors that can occur while reading or writing the stores.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read targets: {0}")]
    RegistryRead(#[source] sqlx::Error),

    #[error("Failed to read price for {title}: {source}")]
    Read {
        title: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to write price for {title}: {source}")]
    Write {
        title: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("No price record for: {0}")]
    NotFound(String),

    #[error("Corrupt record for {title}: {reason}")]
    Corrupt { title: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
