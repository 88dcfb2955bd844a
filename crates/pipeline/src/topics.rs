//! Topic analysis - LLM recommendations over competitor scan data,
//! scored with deliberately simple heuristics.

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use llm::{
    parse_json_response, with_retry, ChatMessage, GenerateOptions, LlmProvider, PromptManager,
    RetryConfig, UsageTracker,
};
use monitor::ScanReport;

use crate::models::TopicRecommendation;

/// Evergreen terms that get a trend bonus. Hardcoded on purpose; this
/// is a heuristic, not a data feed.
const TREND_TERMS: &[&str] = &[
    "service animals",
    "service animal",
    "web accessibility",
    "reasonable accommodation",
    "accessible parking",
    "ada lawsuit",
    "tax credit",
    "wcag",
];

/// Points assigned by trend membership.
const TREND_BONUS: f32 = 15.0;

const TOPIC_PROMPT: &str = "\
Competitors in the {{niche}} space are currently covering these keywords \
(keyword, article count):

{{keyword_summary}}

Recommend {{count}} article topics we should write about next. Prefer gaps: \
keywords competitors touch lightly or miss entirely. Respond with JSON:
{\"topics\": [{\"keyword\": \"...\", \"title\": \"...\", \"rationale\": \"...\"}]}";

const SYSTEM_PROMPT: &str = "\
You are a content strategist for a publisher covering ADA compliance for small \
businesses. You recommend article topics grounded in what competitors publish. \
Always respond with valid JSON.";

/// Raw shape returned by the model.
#[derive(Debug, Deserialize)]
struct RawTopicList {
    topics: Vec<RawTopic>,
}

#[derive(Debug, Deserialize)]
struct RawTopic {
    keyword: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    rationale: String,
}

/// Recommends article topics from competitor scan data.
pub struct TopicAnalyzer {
    provider: Arc<dyn LlmProvider>,
    model: String,
    prompts: PromptManager,
    retry: RetryConfig,
    tracker: UsageTracker,
}

impl TopicAnalyzer {
    /// Create an analyzer.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        tracker: UsageTracker,
    ) -> Result<Self> {
        let mut prompts = PromptManager::new();
        prompts.register("topics", TOPIC_PROMPT)?;

        Ok(Self {
            provider,
            model: model.into(),
            prompts,
            retry: RetryConfig::default(),
            tracker,
        })
    }

    /// Recommend up to `count` topics for the niche.
    ///
    /// Malformed model JSON never fails the step: the analyzer falls
    /// back to heuristic-only recommendations built from the scan.
    pub async fn analyze(
        &self,
        scan: &ScanReport,
        niche: &str,
        count: usize,
    ) -> Result<Vec<TopicRecommendation>> {
        let keyword_summary = scan
            .top_keywords(20)
            .iter()
            .map(|(keyword, freq)| format!("- {keyword}: {freq}"))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = self.prompts.render(
            "topics",
            &serde_json::json!({
                "niche": niche,
                "keyword_summary": keyword_summary,
                "count": count,
            }),
        )?;

        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let options = GenerateOptions {
            temperature: Some(0.4),
            max_tokens: Some(1500),
            json_mode: true,
            ..Default::default()
        };

        let response = with_retry(&self.retry, "topic_analysis", || {
            self.provider.generate(&self.model, &messages, &options)
        })
        .await?;
        self.tracker.record("topic_analysis", &response);

        let raw_topics = match parse_json_response::<RawTopicList>(&response) {
            Ok(list) => list.topics,
            Err(e) => {
                tracing::warn!(error = %e, "Topic JSON unparseable, using heuristic fallback");
                return Ok(heuristic_recommendations(scan, count));
            }
        };

        let mut seen = HashSet::new();
        let mut recommendations: Vec<TopicRecommendation> = raw_topics
            .into_iter()
            .filter(|raw| !raw.keyword.trim().is_empty())
            .filter(|raw| seen.insert(raw.keyword.trim().to_lowercase()))
            .map(|raw| score_topic(&raw.keyword, &raw.title, &raw.rationale, scan))
            .collect();

        recommendations.sort_by(|a, b| {
            b.opportunity_score
                .partial_cmp(&a.opportunity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recommendations.truncate(count);

        tracing::info!(count = recommendations.len(), "Topic analysis complete");
        Ok(recommendations)
    }
}

/// Score a caller-chosen keyword with the same heuristics, bypassing
/// the model entirely.
#[must_use]
pub fn recommendation_for(keyword: &str, scan: &ScanReport) -> TopicRecommendation {
    score_topic(keyword, "", "Requested directly", scan)
}

/// Build recommendations straight from scan keywords, no model involved.
#[must_use]
pub fn heuristic_recommendations(scan: &ScanReport, count: usize) -> Vec<TopicRecommendation> {
    let mut recommendations: Vec<TopicRecommendation> = scan
        .top_keywords(count * 2)
        .iter()
        .map(|(keyword, _)| {
            let title = format!("What Businesses Should Know About {keyword}");
            score_topic(keyword, &title, "Frequent in competitor coverage", scan)
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.opportunity_score
            .partial_cmp(&a.opportunity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    recommendations.truncate(count);
    recommendations
}

/// Apply the scoring heuristics to one keyword.
fn score_topic(keyword: &str, title: &str, rationale: &str, scan: &ScanReport) -> TopicRecommendation {
    let keyword = keyword.trim();
    let searches = estimate_monthly_searches(keyword);
    let competition = competition_score(keyword, scan);
    let trend = trend_bonus(keyword);

    let volume_points = match searches {
        s if s >= 2000 => 80.0,
        s if s >= 1000 => 60.0,
        s if s >= 500 => 40.0,
        _ => 25.0,
    };

    let opportunity_score = (volume_points * 0.6 - competition * 30.0 + trend).clamp(0.0, 100.0);

    TopicRecommendation {
        keyword: keyword.to_string(),
        title_suggestion: if title.is_empty() {
            format!("What Businesses Should Know About {keyword}")
        } else {
            title.to_string()
        },
        rationale: rationale.to_string(),
        estimated_monthly_searches: searches,
        competition,
        opportunity_score,
    }
}

/// Search volume estimate from keyword length bands. Short head terms
/// get the benefit of the doubt; long-tail phrases score lower.
fn estimate_monthly_searches(keyword: &str) -> u32 {
    match keyword.chars().count() {
        0..=10 => 2400,
        11..=18 => 1300,
        19..=28 => 590,
        _ => 210,
    }
}

/// Share of competitor titles already covering the keyword, in [0, 1].
fn competition_score(keyword: &str, scan: &ScanReport) -> f32 {
    if scan.articles.is_empty() {
        return 0.0;
    }
    let mentions = scan.title_mentions(keyword);
    #[allow(clippy::cast_precision_loss)]
    let ratio = mentions as f32 / scan.articles.len() as f32;
    ratio.clamp(0.0, 1.0)
}

/// Trend bonus for evergreen terms.
fn trend_bonus(keyword: &str) -> f32 {
    let lower = keyword.to_lowercase();
    if TREND_TERMS.iter().any(|term| lower.contains(term)) {
        TREND_BONUS
    } else {
        0.0
    }
}
