//! Per-call usage recording and cost estimation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::provider::{ChatResponse, TokenUsage};

/// Price per million tokens, in USD.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

/// Static pricing table, matched by model-name prefix.
const PRICING: &[(&str, ModelPricing)] = &[
    (
        "claude-opus",
        ModelPricing {
            input_per_mtok: 15.0,
            output_per_mtok: 75.0,
        },
    ),
    (
        "claude-sonnet",
        ModelPricing {
            input_per_mtok: 3.0,
            output_per_mtok: 15.0,
        },
    ),
    (
        "claude-3-5-haiku",
        ModelPricing {
            input_per_mtok: 0.8,
            output_per_mtok: 4.0,
        },
    ),
    (
        "gpt-4o-mini",
        ModelPricing {
            input_per_mtok: 0.15,
            output_per_mtok: 0.6,
        },
    ),
    (
        "gpt-4o",
        ModelPricing {
            input_per_mtok: 2.5,
            output_per_mtok: 10.0,
        },
    ),
];

/// Fallback when the model is not in the table.
const DEFAULT_PRICING: ModelPricing = ModelPricing {
    input_per_mtok: 3.0,
    output_per_mtok: 15.0,
};

/// Look up pricing for a model by prefix match.
#[must_use]
pub fn pricing_for(model: &str) -> ModelPricing {
    PRICING
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix))
        .map_or(DEFAULT_PRICING, |(_, pricing)| *pricing)
}

/// Estimate the USD cost of a call.
#[must_use]
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> f64 {
    let pricing = pricing_for(model);
    f64::from(usage.input_tokens) / 1_000_000.0 * pricing.input_per_mtok
        + f64::from(usage.output_tokens) / 1_000_000.0 * pricing.output_per_mtok
}

/// A single recorded generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedCall {
    /// Pipeline step that made the call (e.g. "outline", "fact_check").
    pub step: String,
    pub provider: String,
    pub model: String,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub at: DateTime<Utc>,
}

/// Aggregated usage for one step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepUsage {
    pub calls: usize,
    pub total_tokens: u64,
    pub cost_usd: f64,
}

/// Thread-safe recorder for generation calls.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    calls: Arc<RwLock<Vec<RecordedCall>>>,
}

impl UsageTracker {
    /// Create a new tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed call under a step name.
    pub fn record(&self, step: &str, response: &ChatResponse) {
        let call = RecordedCall {
            step: step.to_string(),
            provider: response.provider.clone(),
            model: response.model.clone(),
            usage: response.usage,
            cost_usd: estimate_cost(&response.model, &response.usage),
            at: Utc::now(),
        };
        if let Ok(mut calls) = self.calls.write() {
            calls.push(call);
        }
    }

    /// All recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }

    /// Total estimated cost across all calls.
    #[must_use]
    pub fn total_cost_usd(&self) -> f64 {
        self.calls
            .read()
            .map(|calls| calls.iter().map(|c| c.cost_usd).sum())
            .unwrap_or(0.0)
    }

    /// Total tokens across all calls.
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.calls
            .read()
            .map(|calls| calls.iter().map(|c| u64::from(c.usage.total())).sum())
            .unwrap_or(0)
    }

    /// Usage aggregated by step name.
    #[must_use]
    pub fn by_step(&self) -> HashMap<String, StepUsage> {
        let mut by_step: HashMap<String, StepUsage> = HashMap::new();
        for call in self.calls() {
            let entry = by_step.entry(call.step.clone()).or_default();
            entry.calls += 1;
            entry.total_tokens += u64::from(call.usage.total());
            entry.cost_usd += call.cost_usd;
        }
        by_step
    }

    /// Drop all recorded calls.
    pub fn reset(&self) {
        if let Ok(mut calls) = self.calls.write() {
            calls.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(model: &str, input: u32, output: u32) -> ChatResponse {
        ChatResponse {
            text: String::new(),
            usage: TokenUsage {
                input_tokens: input,
                output_tokens: output,
            },
            model: model.to_string(),
            provider: "anthropic".to_string(),
        }
    }

    #[test]
    fn test_pricing_prefix_match() {
        let sonnet = pricing_for("claude-sonnet-4-20250514");
        assert!((sonnet.input_per_mtok - 3.0).abs() < f64::EPSILON);

        let unknown = pricing_for("some-new-model");
        assert!((unknown.output_per_mtok - DEFAULT_PRICING.output_per_mtok).abs() < f64::EPSILON);
    }

    #[test]
    fn test_estimate_cost() {
        let usage = TokenUsage {
            input_tokens: 1_000_000,
            output_tokens: 1_000_000,
        };
        let cost = estimate_cost("claude-sonnet-4-20250514", &usage);
        assert!((cost - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_tracker_aggregation() {
        let tracker = UsageTracker::new();
        tracker.record("outline", &response("claude-sonnet-4-20250514", 100, 200));
        tracker.record("body", &response("claude-sonnet-4-20250514", 1000, 2000));
        tracker.record("body", &response("claude-sonnet-4-20250514", 500, 500));

        assert_eq!(tracker.calls().len(), 3);
        assert_eq!(tracker.total_tokens(), 4300);
        assert!(tracker.total_cost_usd() > 0.0);

        let by_step = tracker.by_step();
        assert_eq!(by_step["body"].calls, 2);
        assert_eq!(by_step["outline"].total_tokens, 300);
    }

    #[test]
    fn test_reset() {
        let tracker = UsageTracker::new();
        tracker.record("outline", &response("gpt-4o", 10, 10));
        tracker.reset();
        assert!(tracker.calls().is_empty());
        assert!(tracker.total_cost_usd().abs() < f64::EPSILON);
    }
}
