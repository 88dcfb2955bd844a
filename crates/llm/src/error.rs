//! Error types for the LLM provider layer.

use thiserror::Error;

/// Errors produced by provider clients and prompt machinery.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API key missing for the provider
    #[error("{provider} API key not set ({env_var})")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    /// Provider returned an error response
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// Provider returned a response with no usable text
    #[error("empty completion from {provider}")]
    EmptyCompletion { provider: &'static str },

    /// Model response could not be parsed as the expected JSON shape
    #[error("failed to parse model response: {reason}")]
    ResponseParse { reason: String },

    /// No provider registered under the requested name
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// Prompt template registration failed
    #[error("prompt template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    /// Prompt rendering failed
    #[error("prompt render error: {0}")]
    Render(#[from] handlebars::RenderError),
}

impl LlmError {
    /// Whether a retry is worthwhile. Transport errors and server-side
    /// failures (5xx, 429) are transient; everything else is not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result alias for LLM operations.
pub type LlmResult<T> = Result<T, LlmError>;
