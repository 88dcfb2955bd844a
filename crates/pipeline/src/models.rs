//! Data transfer types passed between pipeline steps.
//!
//! These are created once by a step and consumed by the next; nothing
//! mutates them after construction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::seo::SeoAudit;

/// SEO constraints for a generated article. Missing fields fall back
/// to the defaults when deserialized from API requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoRequirements {
    /// Keyword the article targets.
    pub primary_keyword: String,
    /// Supporting keywords to weave in.
    #[serde(default)]
    pub secondary_keywords: Vec<String>,
    /// Minimum body word count.
    pub min_words: usize,
    /// Maximum body word count.
    pub max_words: usize,
    /// Writing tone.
    pub tone: String,
    /// Intended audience.
    pub audience: String,
}

impl Default for SeoRequirements {
    fn default() -> Self {
        Self {
            primary_keyword: String::new(),
            secondary_keywords: Vec::new(),
            min_words: 1200,
            max_words: 2200,
            tone: "professional but approachable".to_string(),
            audience: "small business owners".to_string(),
        }
    }
}

impl SeoRequirements {
    /// Requirements targeting a keyword, defaults elsewhere.
    #[must_use]
    pub fn for_keyword(keyword: impl Into<String>) -> Self {
        Self {
            primary_keyword: keyword.into(),
            ..Default::default()
        }
    }
}

/// One planned section of an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineSection {
    /// H2 heading.
    pub heading: String,
    /// Optional H3 subheadings.
    #[serde(default)]
    pub subheadings: Vec<String>,
    /// Points the section should cover.
    #[serde(default)]
    pub talking_points: Vec<String>,
}

/// Planned article structure from the outline call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleOutline {
    /// Working title.
    pub title: String,
    /// Hint for the meta description.
    #[serde(default)]
    pub meta_description_hint: Option<String>,
    /// Planned sections.
    pub sections: Vec<OutlineSection>,
}

impl ArticleOutline {
    /// Minimal fallback outline used when the model's outline JSON
    /// cannot be parsed.
    #[must_use]
    pub fn stub(topic: &str) -> Self {
        Self {
            title: topic.to_string(),
            meta_description_hint: None,
            sections: vec![
                OutlineSection {
                    heading: format!("What {topic} means for your business"),
                    subheadings: Vec::new(),
                    talking_points: Vec::new(),
                },
                OutlineSection {
                    heading: "Requirements to know".to_string(),
                    subheadings: Vec::new(),
                    talking_points: Vec::new(),
                },
                OutlineSection {
                    heading: "Next steps".to_string(),
                    subheadings: Vec::new(),
                    talking_points: Vec::new(),
                },
            ],
        }
    }
}

/// A topic the analyzer recommends writing about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRecommendation {
    /// Target keyword.
    pub keyword: String,
    /// Suggested article title.
    pub title_suggestion: String,
    /// Why this topic is worth covering.
    pub rationale: String,
    /// Rough monthly search volume estimate (heuristic).
    pub estimated_monthly_searches: u32,
    /// Competitor coverage in [0, 1].
    pub competition: f32,
    /// Combined opportunity score in [0, 100].
    pub opportunity_score: f32,
}

/// A finished article with metadata and audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArticle {
    pub title: String,
    pub slug: String,
    /// Markdown body, including the single H1.
    pub content_markdown: String,
    pub meta_title: String,
    pub meta_description: String,
    pub tags: Vec<String>,
    pub primary_keyword: String,
    pub word_count: usize,
    /// SEO audit of the final draft.
    #[serde(default)]
    pub seo: SeoAudit,
    /// Model that wrote the body.
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

/// Terminal status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    /// Every step completed.
    Completed,
    /// The article exists but a later step was skipped or failed.
    Partial,
    /// No article was produced.
    Failed,
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Derive a URL slug from a title.
#[must_use]
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Count words the way the length checks do.
#[must_use]
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(
            slugify("Service Animals & the ADA: A Guide"),
            "service-animals-the-ada-a-guide"
        );
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
    }

    #[test]
    fn test_default_requirements() {
        let seo = SeoRequirements::default();
        assert_eq!(seo.min_words, 1200);
        assert_eq!(seo.max_words, 2200);
    }

    #[test]
    fn test_stub_outline_has_sections() {
        let outline = ArticleOutline::stub("ada signage");
        assert_eq!(outline.title, "ada signage");
        assert_eq!(outline.sections.len(), 3);
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("one two  three\nfour"), 4);
        assert_eq!(count_words(""), 0);
    }
}
