use thiserror::Error;

/// Errors that can occur when interacting with the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A value does not fit the storage representation.
    #[error("value out of storage range: {0}")]
    OutOfRange(String),

    /// The backend refused the operation. Used by the in-memory store for
    /// failure injection in tests.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
