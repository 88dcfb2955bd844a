//! Article generation - outline, body, and metadata calls with regex
//! cleanup and a single word-count expansion retry.

use anyhow::Result;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::OnceLock;

use llm::{
    parse_json_response, with_retry, ChatMessage, GenerateOptions, LlmProvider, PromptManager,
    RetryConfig, UsageTracker,
};

use crate::models::{count_words, slugify, ArticleOutline, GeneratedArticle, SeoRequirements};
use crate::seo;

const SYSTEM_PROMPT: &str = "\
You are a senior content writer for a publisher covering ADA compliance for \
small businesses. You write clear, accurate, SEO-aware articles in markdown. \
When asked for JSON, respond with valid JSON and nothing else.";

const OUTLINE_PROMPT: &str = "\
Plan an article about \"{{topic}}\" targeting the keyword \"{{keyword}}\" for \
{{audience}}. Respond with JSON:
{\"title\": \"...\", \"meta_description_hint\": \"...\", \
\"sections\": [{\"heading\": \"...\", \"subheadings\": [], \"talking_points\": []}]}";

const BODY_PROMPT: &str = "\
Write the article \"{{title}}\" in markdown, following this outline:

{{outline}}

Requirements:
- between {{min_words}} and {{max_words}} words
- tone: {{tone}}, audience: {{audience}}
- target keyword \"{{keyword}}\" appears in the first paragraph
- exactly one H1 (the title), H2 for sections
- every image needs descriptive alt text

Return only the markdown.";

const EXPAND_PROMPT: &str = "\
The draft below is {{word_count}} words; it needs at least {{min_words}}. \
Extend the thinnest sections with concrete detail and examples. Keep the \
structure and tone. Return the full revised markdown.

{{draft}}";

const METADATA_PROMPT: &str = "\
For the article titled \"{{title}}\" targeting \"{{keyword}}\", write SEO \
metadata. The meta title must be 45-60 characters; the meta description \
120-160 characters. Respond with JSON:
{\"meta_title\": \"...\", \"meta_description\": \"...\", \"slug\": \"...\", \
\"tags\": [\"...\"]}";

/// Raw metadata shape from the model.
#[derive(Debug, Deserialize)]
struct RawMetadata {
    meta_title: String,
    meta_description: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    tags: Vec<String>,
}

/// Generates articles through sequential outline, body, and metadata
/// calls.
pub struct ArticleWriter {
    provider: Arc<dyn LlmProvider>,
    model: String,
    prompts: PromptManager,
    retry: RetryConfig,
    tracker: UsageTracker,
}

impl ArticleWriter {
    /// Create a writer.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        tracker: UsageTracker,
    ) -> Result<Self> {
        let mut prompts = PromptManager::new();
        prompts.register("outline", OUTLINE_PROMPT)?;
        prompts.register("body", BODY_PROMPT)?;
        prompts.register("expand", EXPAND_PROMPT)?;
        prompts.register("metadata", METADATA_PROMPT)?;

        Ok(Self {
            provider,
            model: model.into(),
            prompts,
            retry: RetryConfig::default(),
            tracker,
        })
    }

    /// Generate an article for a topic.
    pub async fn generate(&self, topic: &str, seo: &SeoRequirements) -> Result<GeneratedArticle> {
        let outline = self.outline(topic, seo).await?;
        tracing::info!(title = %outline.title, sections = outline.sections.len(), "Outline ready");

        let mut content = self.body(&outline, seo).await?;
        let mut words = count_words(&content);

        // One expansion retry, never more. If the expansion is still
        // short the lint records the violation instead.
        if words < seo.min_words {
            tracing::info!(words, min_words = seo.min_words, "Draft short, expanding once");
            let expanded = self.expand(&content, words, seo).await?;
            if count_words(&expanded) > words {
                content = expanded;
                words = count_words(&content);
            }
        }

        let metadata = self.metadata(&outline.title, seo).await;

        let mut article = GeneratedArticle {
            title: outline.title.clone(),
            slug: if metadata.slug.is_empty() {
                slugify(&outline.title)
            } else {
                metadata.slug
            },
            content_markdown: content,
            meta_title: metadata.meta_title,
            meta_description: metadata.meta_description,
            tags: metadata.tags,
            primary_keyword: seo.primary_keyword.clone(),
            word_count: words,
            seo: seo::SeoAudit::default(),
            model: self.model.clone(),
            generated_at: Utc::now(),
        };
        article.seo = seo::audit(&article, seo);

        tracing::info!(
            slug = %article.slug,
            words = article.word_count,
            seo_score = article.seo.score,
            "Article generated"
        );

        Ok(article)
    }

    /// Outline call. Parse failure degrades to a stub outline.
    async fn outline(&self, topic: &str, seo: &SeoRequirements) -> Result<ArticleOutline> {
        let prompt = self.prompts.render(
            "outline",
            &serde_json::json!({
                "topic": topic,
                "keyword": seo.primary_keyword,
                "audience": seo.audience,
            }),
        )?;

        let options = GenerateOptions {
            temperature: Some(0.3),
            max_tokens: Some(1500),
            json_mode: true,
            ..Default::default()
        };
        let response = self.call("outline", &prompt, &options).await?;

        Ok(parse_json_response::<ArticleOutline>(&response).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Outline JSON unparseable, using stub outline");
            ArticleOutline::stub(topic)
        }))
    }

    /// Body call plus cleanup.
    async fn body(&self, outline: &ArticleOutline, seo: &SeoRequirements) -> Result<String> {
        let outline_text = outline
            .sections
            .iter()
            .map(|section| {
                let mut block = format!("## {}", section.heading);
                for sub in &section.subheadings {
                    block.push_str(&format!("\n### {sub}"));
                }
                for point in &section.talking_points {
                    block.push_str(&format!("\n- {point}"));
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = self.prompts.render(
            "body",
            &serde_json::json!({
                "title": outline.title,
                "outline": outline_text,
                "min_words": seo.min_words,
                "max_words": seo.max_words,
                "tone": seo.tone,
                "audience": seo.audience,
                "keyword": seo.primary_keyword,
            }),
        )?;

        let options = GenerateOptions {
            temperature: Some(0.7),
            max_tokens: Some(8000),
            ..Default::default()
        };
        let response = self.call("body", &prompt, &options).await?;

        Ok(cleanup_markdown(&response.text, &outline.title))
    }

    /// Single expansion call for a short draft.
    async fn expand(&self, draft: &str, word_count: usize, seo: &SeoRequirements) -> Result<String> {
        let prompt = self.prompts.render(
            "expand",
            &serde_json::json!({
                "draft": draft,
                "word_count": word_count,
                "min_words": seo.min_words,
            }),
        )?;

        let options = GenerateOptions {
            temperature: Some(0.7),
            max_tokens: Some(8000),
            ..Default::default()
        };
        let response = self.call("expand", &prompt, &options).await?;

        Ok(cleanup_markdown(&response.text, ""))
    }

    /// Metadata call. Any failure degrades to derived metadata.
    async fn metadata(&self, title: &str, seo: &SeoRequirements) -> RawMetadata {
        let fallback = || RawMetadata {
            meta_title: truncate_chars(title, 60),
            meta_description: format!(
                "{} explained for {}: requirements, common mistakes, and practical next steps.",
                truncate_chars(title, 80),
                seo.audience
            ),
            slug: slugify(title),
            tags: vec![seo.primary_keyword.clone()],
        };

        let Ok(prompt) = self.prompts.render(
            "metadata",
            &serde_json::json!({
                "title": title,
                "keyword": seo.primary_keyword,
            }),
        ) else {
            return fallback();
        };

        let options = GenerateOptions {
            temperature: Some(0.2),
            max_tokens: Some(500),
            json_mode: true,
            ..Default::default()
        };

        match self.call("metadata", &prompt, &options).await {
            Ok(response) => parse_json_response::<RawMetadata>(&response).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Metadata JSON unparseable, deriving from title");
                fallback()
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Metadata call failed, deriving from title");
                fallback()
            }
        }
    }

    async fn call(
        &self,
        step: &str,
        prompt: &str,
        options: &GenerateOptions,
    ) -> llm::LlmResult<llm::ChatResponse> {
        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];
        let response = with_retry(&self.retry, step, || {
            self.provider.generate(&self.model, &messages, options)
        })
        .await?;
        self.tracker.record(step, &response);
        Ok(response)
    }
}

/// Strip wrapper fences, collapse blank runs, and normalize to exactly
/// one H1.
#[must_use]
pub fn cleanup_markdown(raw: &str, title: &str) -> String {
    static BLANK_RUN: OnceLock<regex::Regex> = OnceLock::new();
    let blank_run = BLANK_RUN.get_or_init(|| regex::Regex::new(r"\n{3,}").unwrap());

    let mut text = raw.trim().to_string();

    // Models sometimes wrap the whole document in a code fence.
    if text.starts_with("```") {
        text = text
            .trim_start_matches("```markdown")
            .trim_start_matches("```md")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
            .to_string();
    }

    text = blank_run.replace_all(&text, "\n\n").to_string();

    // Exactly one H1: demote extras, synthesize one if missing.
    let mut h1_seen = false;
    let mut lines: Vec<String> = Vec::with_capacity(text.lines().count());
    for line in text.lines() {
        if line.trim_start().starts_with("# ") {
            if h1_seen {
                lines.push(format!("#{}", line.trim_start()));
                continue;
            }
            h1_seen = true;
        }
        lines.push(line.to_string());
    }

    let mut result = lines.join("\n");
    if !h1_seen && !title.is_empty() {
        result = format!("# {title}\n\n{result}");
    }
    result
}

/// Truncate to a character budget without splitting a word when
/// avoidable.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(idx) if idx > max_chars / 2 => cut[..idx].to_string(),
        _ => cut,
    }
}
