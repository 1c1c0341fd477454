//! Error types for the persistence layer.

/// Errors that can occur while loading or saving floor state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored record could not be mapped back into the in-memory model
    /// (e.g. an unknown phase string or malformed queue JSON).
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
