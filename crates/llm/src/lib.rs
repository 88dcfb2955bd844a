#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

//! # LLM
//!
//! Provider abstraction for the content pipeline's model calls.
//!
//! This crate provides:
//! - A `LlmProvider` trait with Anthropic and OpenAI implementations
//! - JSON response parsing that tolerates markdown code fences
//! - Retry with exponential backoff for transient API failures
//! - Handlebars-based prompt templates
//! - Per-call usage recording with cost estimation

pub mod anthropic;
pub mod error;
pub mod openai;
pub mod prompts;
pub mod provider;
pub mod registry;
pub mod retry;
pub mod usage;

pub use anthropic::AnthropicClient;
pub use error::{LlmError, LlmResult};
pub use openai::OpenAiClient;
pub use prompts::PromptManager;
pub use provider::{
    parse_json_response, ChatMessage, ChatResponse, ChatRole, GenerateOptions, LlmProvider,
    TokenUsage,
};
pub use registry::ProviderRegistry;
pub use retry::{with_retry, RetryConfig};
pub use usage::{estimate_cost, RecordedCall, StepUsage, UsageTracker};
