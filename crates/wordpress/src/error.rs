//! Error types for WordPress publishing.

use thiserror::Error;

/// Errors that can occur while publishing to WordPress.
#[derive(Debug, Error)]
pub enum PublishError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// WordPress REST API returned an error
    #[error("WordPress API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// WPGraphQL returned errors
    #[error("WPGraphQL error: {0}")]
    GraphQl(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Publisher is missing required configuration
    #[error("Publisher not configured: {0}")]
    NotConfigured(String),
}

/// Result alias for publishing operations.
pub type PublishResult<T> = Result<T, PublishError>;
