//! Provider trait and common chat types.
//!
//! Defines the interface that all LLM providers must implement.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, LlmResult};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System message (sets context/behavior)
    System,
    /// User message (input)
    User,
    /// Assistant message (model response)
    Assistant,
}

/// A message in a conversation with a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: ChatRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens
    pub input_tokens: u32,
    /// Number of output tokens
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Total tokens consumed by the call.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Response from a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Generated text content
    pub text: String,
    /// Token usage information
    pub usage: TokenUsage,
    /// Model that generated the response
    pub model: String,
    /// Provider that generated the response
    pub provider: String,
}

/// Options for text generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
    /// Whether to request JSON output
    pub json_mode: bool,
}

/// Trait for LLM providers.
///
/// All providers (Anthropic, OpenAI, etc.) must implement this trait.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "anthropic", "openai").
    fn name(&self) -> &'static str;

    /// Get the environment variable name for the API key.
    fn api_key_env_var(&self) -> &'static str;

    /// Check if the provider is configured (has API key).
    fn is_configured(&self) -> bool;

    /// Get the list of supported models.
    fn supported_models(&self) -> Vec<&str>;

    /// Check if a model is supported.
    fn supports_model(&self, model: &str) -> bool {
        self.supported_models().contains(&model)
    }

    /// Generate text from messages.
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> LlmResult<ChatResponse>;
}

/// Parse a model response as a typed JSON value.
///
/// Standalone function rather than a trait method because generic
/// methods are not dyn-compatible. Models routinely wrap JSON in
/// markdown code fences; those are stripped before parsing.
pub fn parse_json_response<T: for<'de> Deserialize<'de>>(response: &ChatResponse) -> LlmResult<T> {
    let text = response.text.trim();

    let json_text = if let Some(stripped) = text.strip_prefix("```json") {
        stripped.strip_suffix("```").unwrap_or(stripped).trim()
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped.strip_suffix("```").unwrap_or(stripped).trim()
    } else {
        text
    };

    serde_json::from_str(json_text).map_err(|e| LlmError::ResponseParse {
        reason: format!("{e}; response: {text}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(text: &str) -> ChatResponse {
        ChatResponse {
            text: text.to_string(),
            usage: TokenUsage::default(),
            model: "test".to_string(),
            provider: "test".to_string(),
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        value: u32,
    }

    #[test]
    fn test_parse_plain_json() {
        let parsed: Payload = parse_json_response(&response(r#"{"value": 7}"#)).unwrap();
        assert_eq!(parsed, Payload { value: 7 });
    }

    #[test]
    fn test_parse_fenced_json() {
        let parsed: Payload =
            parse_json_response(&response("```json\n{\"value\": 7}\n```")).unwrap();
        assert_eq!(parsed, Payload { value: 7 });

        let parsed: Payload = parse_json_response(&response("```\n{\"value\": 3}\n```")).unwrap();
        assert_eq!(parsed, Payload { value: 3 });
    }

    #[test]
    fn test_parse_failure_carries_text() {
        let err = parse_json_response::<Payload>(&response("not json")).unwrap_err();
        assert!(err.to_string().contains("not json"));
    }

    #[test]
    fn test_message_constructors() {
        assert_eq!(ChatMessage::system("a").role, ChatRole::System);
        assert_eq!(ChatMessage::user("b").role, ChatRole::User);
        assert_eq!(ChatMessage::assistant("c").role, ChatRole::Assistant);
    }
}
