//! Error types for the persistence layer.

use thiserror::Error;

/// Errors from database, cache, and embedding operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database operation failed
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis operation failed
    #[error("cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Embeddings API call failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Embeddings API returned an unusable response
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Requested row does not exist
    #[error("not found: {0}")]
    NotFound(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
