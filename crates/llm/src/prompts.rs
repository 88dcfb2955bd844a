//! Prompt template management with Handlebars.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{LlmError, LlmResult};

/// Registry of named prompt templates.
///
/// Templates are registered once at construction and rendered with
/// per-call data. Strict mode makes a missing variable a render error
/// instead of silently producing an empty string.
pub struct PromptManager {
    registry: Handlebars<'static>,
}

impl PromptManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        Self { registry }
    }

    /// Register a template under a name.
    pub fn register(&mut self, name: &str, template: &str) -> LlmResult<()> {
        self.registry
            .register_template_string(name, template)
            .map_err(|e| LlmError::Template(Box::new(e)))
    }

    /// Render a registered template with the given data.
    pub fn render<T: Serialize>(&self, name: &str, data: &T) -> LlmResult<String> {
        Ok(self.registry.render(name, data)?)
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_with_data() {
        let mut prompts = PromptManager::new();
        prompts
            .register("topic", "Suggest {{count}} topics about {{niche}}.")
            .unwrap();

        let rendered = prompts
            .render(
                "topic",
                &serde_json::json!({"count": 5, "niche": "ADA compliance"}),
            )
            .unwrap();
        assert_eq!(rendered, "Suggest 5 topics about ADA compliance.");
    }

    #[test]
    fn test_strict_mode_rejects_missing_variable() {
        let mut prompts = PromptManager::new();
        prompts.register("t", "Hello {{name}}").unwrap();

        let result = prompts.render("t", &serde_json::json!({}));
        assert!(result.is_err());
    }
}
