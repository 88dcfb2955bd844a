//! OpenAI GPT provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{LlmError, LlmResult};
use crate::provider::{ChatMessage, ChatResponse, ChatRole, GenerateOptions, LlmProvider, TokenUsage};

/// OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model
const DEFAULT_MODEL: &str = "gpt-4o";

/// Supported OpenAI models
const SUPPORTED_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-4.1", "gpt-4.1-mini"];

/// OpenAI API request message
#[derive(Debug, Serialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

/// OpenAI API response format
#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// OpenAI API request
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// OpenAI API response choice message
#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI API response choice
#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

/// OpenAI API usage
#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// OpenAI API response
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    model: String,
    usage: CompletionUsage,
}

/// OpenAI API error
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// OpenAI GPT provider.
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiClient {
    /// Create a new OpenAI client with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            client: Client::new(),
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn convert_messages(messages: &[ChatMessage]) -> Vec<CompletionMessage> {
        messages
            .iter()
            .map(|msg| CompletionMessage {
                role: match msg.role {
                    ChatRole::System => "system".to_string(),
                    ChatRole::User => "user".to_string(),
                    ChatRole::Assistant => "assistant".to_string(),
                },
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn api_key_env_var(&self) -> &'static str {
        "OPENAI_API_KEY"
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
            provider: "openai",
            env_var: "OPENAI_API_KEY",
        })?;

        let request = CompletionRequest {
            model: model.to_string(),
            messages: Self::convert_messages(messages),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stop: options.stop_sequences.clone(),
            response_format: options.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        tracing::debug!(model = %request.model, "Calling OpenAI chat completions API");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map_or(body, |parsed| parsed.error.message);
            return Err(LlmError::Api {
                provider: "openai",
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CompletionResponse = response.json().await?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        if text.is_empty() {
            return Err(LlmError::EmptyCompletion { provider: "openai" });
        }

        Ok(ChatResponse {
            text,
            usage: TokenUsage {
                input_tokens: parsed.usage.prompt_tokens,
                output_tokens: parsed.usage.completion_tokens,
            },
            model: parsed.model,
            provider: "openai".to_string(),
        })
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Get the default OpenAI model.
#[must_use]
pub fn default_model() -> &'static str {
    DEFAULT_MODEL
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_provider_name() {
        let client = OpenAiClient::new("sk-test");
        assert_eq!(client.name(), "openai");
        assert!(client.supports_model("gpt-4o"));
        assert!(!client.supports_model("claude-sonnet-4-20250514"));
    }

    #[tokio::test]
    async fn test_json_mode_sets_response_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{\"ok\": true}"}}],
                "model": "gpt-4o",
                "usage": {"prompt_tokens": 5, "completion_tokens": 6}
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test")
            .with_base_url(format!("{}/v1/chat/completions", server.uri()));

        let options = GenerateOptions {
            json_mode: true,
            ..Default::default()
        };
        let response = client
            .generate("gpt-4o", &[ChatMessage::user("go")], &options)
            .await
            .unwrap();

        assert_eq!(response.text, "{\"ok\": true}");
        assert_eq!(response.usage.total(), 11);
    }
}
