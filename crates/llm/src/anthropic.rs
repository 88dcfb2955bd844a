//! Anthropic Claude provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, LlmResult};
use crate::provider::{ChatMessage, ChatResponse, ChatRole, GenerateOptions, LlmProvider, TokenUsage};

/// Anthropic API endpoint
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Supported Anthropic models
const SUPPORTED_MODELS: &[&str] = &[
    // Short names for convenience
    "opus",
    "sonnet",
    "haiku",
    // Claude 4.5 models
    "claude-opus-4-5-20251101",
    "claude-sonnet-4-5-20250929",
    // Claude 4.1 models
    "claude-opus-4-1-20250805",
    // Claude 4 models
    "claude-sonnet-4-20250514",
    // Claude 3.5 models
    "claude-3-5-haiku-20241022",
    // Claude 3 models
    "claude-3-haiku-20240307",
];

/// Normalize model name to the canonical API model name.
fn normalize_model(model: &str) -> &str {
    match model {
        "opus" => "claude-opus-4-5-20251101",
        "sonnet" => "claude-sonnet-4-5-20250929",
        "haiku" => "claude-3-5-haiku-20241022",
        _ => model,
    }
}

/// Anthropic API request message
#[derive(Debug, Serialize)]
struct MessageParam {
    role: String,
    content: String,
}

/// Anthropic API request
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<MessageParam>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

/// Anthropic API response content block
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    block_type: String,
    #[serde(default)]
    text: String,
}

/// Anthropic API usage
#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic API response
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    usage: MessagesUsage,
}

/// Anthropic API error
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Anthropic API error response
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// Anthropic Claude provider.
pub struct AnthropicClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl AnthropicClient {
    /// Create a new Anthropic client with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Create from the `ANTHROPIC_API_KEY` environment variable.
    ///
    /// A missing key is not an error here; the client reports itself
    /// unconfigured and fails at call time.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            client: Client::new(),
            api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Convert messages to Anthropic format, extracting the system message.
    fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<MessageParam>) {
        let mut system = None;
        let mut converted = Vec::new();

        for msg in messages {
            match msg.role {
                // Anthropic takes the system prompt as a separate field
                ChatRole::System => system = Some(msg.content.clone()),
                ChatRole::User => converted.push(MessageParam {
                    role: "user".to_string(),
                    content: msg.content.clone(),
                }),
                ChatRole::Assistant => converted.push(MessageParam {
                    role: "assistant".to_string(),
                    content: msg.content.clone(),
                }),
            }
        }

        (system, converted)
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    fn api_key_env_var(&self) -> &'static str {
        "ANTHROPIC_API_KEY"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn supported_models(&self) -> Vec<&str> {
        SUPPORTED_MODELS.to_vec()
    }

    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> LlmResult<ChatResponse> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::MissingApiKey {
            provider: "anthropic",
            env_var: "ANTHROPIC_API_KEY",
        })?;

        let (system, converted) = Self::convert_messages(messages);

        let request = MessagesRequest {
            model: normalize_model(model).to_string(),
            messages: converted,
            max_tokens: options.max_tokens.unwrap_or(4096),
            system,
            temperature: options.temperature,
            stop_sequences: options.stop_sequences.clone(),
        };

        tracing::debug!(model = %request.model, "Calling Anthropic messages API");

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body).map_or(body, |parsed| {
                format!("{}: {}", parsed.error.error_type, parsed.error.message)
            });
            return Err(LlmError::Api {
                provider: "anthropic",
                status: status.as_u16(),
                message,
            });
        }

        let parsed: MessagesResponse = response.json().await?;

        let text: String = parsed
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect();
        if text.is_empty() {
            return Err(LlmError::EmptyCompletion {
                provider: "anthropic",
            });
        }

        tracing::debug!(
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Anthropic call complete"
        );

        Ok(ChatResponse {
            text,
            usage: TokenUsage {
                input_tokens: parsed.usage.input_tokens,
                output_tokens: parsed.usage.output_tokens,
            },
            model: parsed.model,
            provider: "anthropic".to_string(),
        })
    }
}

impl Default for AnthropicClient {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Get the default Anthropic model.
#[must_use]
pub fn default_model() -> &'static str {
    DEFAULT_MODEL
}
