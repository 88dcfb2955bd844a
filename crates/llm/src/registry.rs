//! Provider registry - manages LLM provider instances.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::anthropic::AnthropicClient;
use crate::openai::OpenAiClient;
use crate::provider::LlmProvider;

/// Registry for LLM providers, keyed by provider name.
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Arc<dyn LlmProvider>>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with the default providers registered from env.
    #[must_use]
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(AnthropicClient::from_env()));
        registry.register(Arc::new(OpenAiClient::from_env()));
        registry
    }

    /// Register a provider.
    pub fn register(&self, provider: Arc<dyn LlmProvider>) {
        let mut providers = self.providers.write().unwrap();
        providers.insert(provider.name().to_string(), provider);
    }

    /// Get a provider by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn LlmProvider>> {
        let providers = self.providers.read().unwrap();
        providers.get(name).cloned()
    }

    /// Get the provider that supports the given model, if any.
    #[must_use]
    pub fn for_model(&self, model: &str) -> Option<Arc<dyn LlmProvider>> {
        let providers = self.providers.read().unwrap();
        providers
            .values()
            .find(|p| p.supports_model(model))
            .cloned()
    }

    /// Get the first configured provider, preferring Anthropic.
    #[must_use]
    pub fn get_configured(&self) -> Option<Arc<dyn LlmProvider>> {
        if let Some(provider) = self.get("anthropic").filter(|p| p.is_configured()) {
            return Some(provider);
        }
        let providers = self.providers.read().unwrap();
        providers.values().find(|p| p.is_configured()).cloned()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
