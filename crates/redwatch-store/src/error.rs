use thiserror::Error;

/// Errors that can occur in the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON column (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No row matched a lookup that requires one.
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
