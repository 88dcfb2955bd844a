//! Pipeline orchestrator - the fixed five-step sequential coordinator.
//!
//! Scan → topic → article → legal/SEO check → publish, each step a
//! single await. Failures either degrade (scan, fact check, publish)
//! or fail the run (topic, generation); every error lands in
//! `PipelineResult.errors` as a string.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use llm::{LlmProvider, UsageTracker};
use monitor::{CompetitorMonitor, CompetitorSite, ScanCache, ScanReport};
use store::{NewArticle, Store};
use wordpress::{markdown_to_html, PostStatus, PublishOutcome, Publisher};

use crate::legal::{FactCheckReport, FactChecker};
use crate::models::{
    GeneratedArticle, PipelineStatus, SeoRequirements, TopicRecommendation,
};
use crate::storage::ArtifactStore;
use crate::topics::{self, TopicAnalyzer};
use crate::writer::ArticleWriter;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Content niche used in prompts and categories.
    pub niche: String,
    /// Model for all generation calls.
    pub model: String,
    /// Directory for run artifacts and the scan cache.
    pub output_dir: PathBuf,
    /// How many topic recommendations to request.
    pub max_topics: usize,
    /// Competitor sites to scan.
    pub sites: Vec<CompetitorSite>,
    /// Scan cache freshness window, in hours.
    pub scan_cache_max_age_hours: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            niche: "ADA compliance".to_string(),
            model: llm::anthropic::default_model().to_string(),
            output_dir: PathBuf::from("./data"),
            max_topics: 5,
            sites: Vec::new(),
            scan_cache_max_age_hours: 6,
        }
    }
}

/// One pipeline run request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineRequest {
    /// Topic to write about; when absent the analyzer picks one.
    #[serde(default)]
    pub topic: Option<String>,
    /// SEO constraints; an empty primary keyword inherits the topic.
    #[serde(default)]
    pub seo: Option<SeoRequirements>,
    /// Whether to publish to WordPress.
    #[serde(default)]
    pub publish: bool,
    /// Update an existing post with the same slug instead of skipping.
    #[serde(default)]
    pub force_update: bool,
    /// Skip the competitor scan step.
    #[serde(default)]
    pub skip_scan: bool,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub id: Uuid,
    pub status: PipelineStatus,
    pub topic: Option<TopicRecommendation>,
    pub article: Option<GeneratedArticle>,
    pub fact_check: Option<FactCheckReport>,
    pub publish: Option<PublishOutcome>,
    /// Step errors, in the order they occurred.
    pub errors: Vec<String>,
    /// Estimated LLM spend for this run.
    pub llm_cost_usd: f64,
    /// Tokens consumed by this run.
    pub total_tokens: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Coordinates the five pipeline steps. All collaborators are injected;
/// optional ones (monitor, publisher, store) disable their step when
/// absent.
pub struct Orchestrator {
    monitor: Option<CompetitorMonitor>,
    topics: TopicAnalyzer,
    writer: ArticleWriter,
    checker: FactChecker,
    publisher: Option<Publisher>,
    store: Option<Store>,
    artifacts: ArtifactStore,
    tracker: UsageTracker,
    config: PipelineConfig,
}

impl Orchestrator {
    /// Create an orchestrator with the required collaborators.
    pub fn new(provider: Arc<dyn LlmProvider>, config: PipelineConfig) -> Result<Self> {
        let tracker = UsageTracker::new();
        let topics = TopicAnalyzer::new(provider.clone(), config.model.as_str(), tracker.clone())?;
        let writer = ArticleWriter::new(provider, config.model.as_str(), tracker.clone())?;
        let artifacts = ArtifactStore::new(&config.output_dir);

        Ok(Self {
            monitor: None,
            topics,
            writer,
            checker: FactChecker::new(),
            publisher: None,
            store: None,
            artifacts,
            tracker,
            config,
        })
    }

    /// Attach a competitor monitor.
    #[must_use]
    pub fn with_monitor(mut self, monitor: CompetitorMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    /// Attach a WordPress publisher.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Attach the database store.
    #[must_use]
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Shared usage tracker.
    #[must_use]
    pub fn tracker(&self) -> &UsageTracker {
        &self.tracker
    }

    /// Orchestrator configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Scan competitors, using the cached report when fresh.
    pub async fn scan_competitors(&self) -> Result<ScanReport> {
        let monitor = self
            .monitor
            .as_ref()
            .ok_or_else(|| anyhow!("competitor monitor not configured"))?;

        let cache = ScanCache::new(
            self.config.output_dir.join("scan_cache.json"),
            chrono::Duration::hours(self.config.scan_cache_max_age_hours),
        );
        if let Some(cached) = cache.load_fresh() {
            tracing::info!(articles = cached.articles.len(), "Using cached competitor scan");
            return Ok(cached);
        }

        let report = monitor.scan(&self.config.sites).await?;
        if let Err(e) = cache.save(&report) {
            tracing::warn!(error = %e, "Failed to write scan cache");
        }

        if let Some(store) = &self.store {
            for article in &report.articles {
                if let Err(e) = store
                    .upsert_competitor_article(&article.site, &article.url, &article.title)
                    .await
                {
                    tracing::warn!(url = %article.url, error = %e, "Failed to persist competitor article");
                }
            }
        }

        Ok(report)
    }

    /// Recommend topics for the niche.
    pub async fn analyze_topics(&self, scan: &ScanReport) -> Result<Vec<TopicRecommendation>> {
        self.topics
            .analyze(scan, &self.config.niche, self.config.max_topics)
            .await
    }

    /// Generate a single article.
    pub async fn generate_article(
        &self,
        topic: &str,
        seo: &SeoRequirements,
    ) -> Result<GeneratedArticle> {
        self.writer.generate(topic, seo).await
    }

    /// Fact-check article markdown.
    #[must_use]
    pub fn fact_check(&self, article: &GeneratedArticle) -> FactCheckReport {
        self.checker.check(&article.content_markdown)
    }

    /// Run the full pipeline with a fresh run ID.
    pub async fn run_pipeline(&self, request: PipelineRequest) -> PipelineResult {
        self.run_with_id(Uuid::new_v4(), request).await
    }

    /// Run the full pipeline under a caller-chosen run ID (the dashboard
    /// hands the ID back before the run finishes).
    pub async fn run_with_id(&self, id: Uuid, request: PipelineRequest) -> PipelineResult {
        let started_at = Utc::now();
        let timer = Instant::now();
        let cost_before = self.tracker.total_cost_usd();
        let tokens_before = self.tracker.total_tokens();
        let mut errors: Vec<String> = Vec::new();

        tracing::info!(pipeline_id = %id, topic = ?request.topic, "Pipeline started");

        if let Some(store) = &self.store {
            if let Err(e) = store.create_pipeline(id, request.topic.as_deref()).await {
                tracing::warn!(error = %e, "Failed to record pipeline start");
            }
        }

        // Step 1: competitor scan. Failure degrades to an empty report.
        let scan = if request.skip_scan || self.monitor.is_none() {
            ScanReport::default()
        } else {
            match self.scan_competitors().await {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!(error = %e, "Competitor scan failed, continuing without it");
                    errors.push(format!("scan: {e}"));
                    ScanReport::default()
                }
            }
        };

        // Step 2: topic selection. No topic means no article: fatal.
        let topic = if let Some(requested) = &request.topic {
            topics::recommendation_for(requested, &scan)
        } else {
            match self.analyze_topics(&scan).await {
                Ok(mut recommendations) if !recommendations.is_empty() => {
                    recommendations.remove(0)
                }
                Ok(_) => {
                    errors.push("topics: no recommendations produced".to_string());
                    return self
                        .finish(id, started_at, timer, PipelineStatus::Failed, None, None, None, None, errors, cost_before, tokens_before)
                        .await;
                }
                Err(e) => {
                    errors.push(format!("topics: {e}"));
                    return self
                        .finish(id, started_at, timer, PipelineStatus::Failed, None, None, None, None, errors, cost_before, tokens_before)
                        .await;
                }
            }
        };

        // Step 3: article generation. Fatal on failure.
        let mut seo = request.seo.clone().unwrap_or_default();
        if seo.primary_keyword.is_empty() {
            seo.primary_keyword = topic.keyword.clone();
        }

        let article = match self.generate_article(&topic.keyword, &seo).await {
            Ok(article) => article,
            Err(e) => {
                errors.push(format!("generation: {e}"));
                return self
                    .finish(id, started_at, timer, PipelineStatus::Failed, Some(topic), None, None, None, errors, cost_before, tokens_before)
                    .await;
            }
        };

        // Step 4: legal fact check. A failing report blocks publishing
        // but keeps the article.
        let fact_check = self.fact_check(&article);
        let facts_ok = fact_check.passed;
        if !facts_ok {
            errors.push(format!(
                "fact_check: {} incorrect claims, accuracy {:.2}",
                fact_check.incorrect_claims().len(),
                fact_check.accuracy
            ));
        }

        // Step 5: publish.
        let mut publish_outcome = None;
        if request.publish && facts_ok {
            match &self.publisher {
                Some(publisher) => {
                    let publish_request = wordpress::PublishRequest {
                        title: article.title.clone(),
                        slug: article.slug.clone(),
                        content_html: markdown_to_html(&article.content_markdown),
                        excerpt: Some(article.meta_description.clone()),
                        status: PostStatus::Draft,
                        categories: vec![self.config.niche.clone()],
                        tags: article.tags.clone(),
                    };
                    match publisher.publish(&publish_request, request.force_update).await {
                        Ok(outcome) => {
                            tracing::info!(
                                slug = %article.slug,
                                post_id = outcome.post().id,
                                "Publish step complete"
                            );
                            publish_outcome = Some(outcome);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Publish failed");
                            errors.push(format!("publish: {e}"));
                        }
                    }
                }
                None => errors.push("publish: publisher not configured".to_string()),
            }
        }

        let publish_incomplete = request.publish && publish_outcome.is_none();
        let status = if !facts_ok || publish_incomplete {
            PipelineStatus::Partial
        } else {
            PipelineStatus::Completed
        };

        self.finish(
            id,
            started_at,
            timer,
            status,
            Some(topic),
            Some(article),
            Some(fact_check),
            publish_outcome,
            errors,
            cost_before,
            tokens_before,
        )
        .await
    }

    /// Assemble the result and persist it (best effort).
    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        id: Uuid,
        started_at: DateTime<Utc>,
        timer: Instant,
        status: PipelineStatus,
        topic: Option<TopicRecommendation>,
        article: Option<GeneratedArticle>,
        fact_check: Option<FactCheckReport>,
        publish: Option<PublishOutcome>,
        errors: Vec<String>,
        cost_before: f64,
        tokens_before: u64,
    ) -> PipelineResult {
        let result = PipelineResult {
            id,
            status,
            topic,
            article,
            fact_check,
            publish,
            errors,
            llm_cost_usd: self.tracker.total_cost_usd() - cost_before,
            total_tokens: self.tracker.total_tokens() - tokens_before,
            started_at,
            duration_ms: u64::try_from(timer.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        if let Some(store) = &self.store {
            let article_id = match &result.article {
                Some(article) => {
                    let row = NewArticle {
                        title: article.title.clone(),
                        slug: article.slug.clone(),
                        content: article.content_markdown.clone(),
                        meta_title: Some(article.meta_title.clone()),
                        meta_description: Some(article.meta_description.clone()),
                        status: result
                            .publish
                            .as_ref()
                            .map_or_else(|| "draft".to_string(), |p| p.post().status.clone()),
                        word_count: i32::try_from(article.word_count).unwrap_or(i32::MAX),
                        seo_score: i32::from(article.seo.score),
                    };
                    match store.insert_article(&row).await {
                        Ok(record) => Some(record.id),
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to persist article");
                            None
                        }
                    }
                }
                None => None,
            };

            if let Err(e) = store
                .finish_pipeline(
                    id,
                    &result.status.to_string(),
                    article_id,
                    result.llm_cost_usd,
                    i64::try_from(result.total_tokens).unwrap_or(i64::MAX),
                    &result.errors,
                )
                .await
            {
                tracing::warn!(error = %e, "Failed to record pipeline result");
            }
        }

        if let Err(e) = self.artifacts.save_result(&result) {
            tracing::warn!(error = %e, "Failed to write run artifact");
        }
        if let Some(article) = &result.article {
            if let Err(e) = self.artifacts.save_article(article) {
                tracing::warn!(error = %e, "Failed to write article markdown");
            }
        }

        tracing::info!(
            pipeline_id = %id,
            status = %result.status,
            cost_usd = result.llm_cost_usd,
            tokens = result.total_tokens,
            errors = result.errors.len(),
            duration_ms = result.duration_ms,
            "Pipeline finished"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm::{ChatMessage, ChatResponse, GenerateOptions, LlmError, LlmResult, TokenUsage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays scripted responses, or fails every call.
    struct StubProvider {
        responses: Mutex<VecDeque<String>>,
        fail: bool,
    }

    impl StubProvider {
        fn scripted(responses: Vec<String>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(VecDeque::new()),
                fail: true,
            })
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }
        fn api_key_env_var(&self) -> &'static str {
            "STUB_API_KEY"
        }
        fn is_configured(&self) -> bool {
            true
        }
        fn supported_models(&self) -> Vec<&str> {
            vec!["stub-model"]
        }

        async fn generate(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _options: &GenerateOptions,
        ) -> LlmResult<ChatResponse> {
            if self.fail {
                return Err(LlmError::Api {
                    provider: "stub",
                    status: 400,
                    message: "scripted failure".to_string(),
                });
            }
            let text = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("stub ran out of scripted responses");
            Ok(ChatResponse {
                text,
                usage: TokenUsage {
                    input_tokens: 50,
                    output_tokens: 150,
                },
                model: "stub-model".to_string(),
                provider: "stub".to_string(),
            })
        }
    }

    fn outline_json() -> String {
        serde_json::json!({
            "title": "Service Animals and the ADA",
            "sections": [{"heading": "Overview", "subheadings": [], "talking_points": []}]
        })
        .to_string()
    }

    fn metadata_json() -> String {
        serde_json::json!({
            "meta_title": "Service Animals and the ADA: Rules for Businesses",
            "meta_description": "What the ADA actually requires for service animals, \
                which questions staff can ask, and the registration myths to avoid.",
            "slug": "service-animals-ada",
            "tags": ["ada"]
        })
        .to_string()
    }

    fn clean_body() -> String {
        let filler = "Service animals help customers every day. ".repeat(40);
        format!("# Service Animals and the ADA\n\nservice animals intro.\n\n{filler}")
    }

    fn config(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            output_dir: dir.to_path_buf(),
            model: "stub-model".to_string(),
            ..Default::default()
        }
    }

    fn request(topic: &str) -> PipelineRequest {
        PipelineRequest {
            topic: Some(topic.to_string()),
            seo: Some(SeoRequirements {
                primary_keyword: "service animals".to_string(),
                min_words: 20,
                max_words: 100_000,
                ..Default::default()
            }),
            publish: false,
            force_update: false,
            skip_scan: true,
        }
    }

    #[tokio::test]
    async fn test_run_pipeline_completes() {
        let dir = tempfile::tempdir().unwrap();
        let provider =
            StubProvider::scripted(vec![outline_json(), clean_body(), metadata_json()]);
        let orchestrator = Orchestrator::new(provider, config(dir.path())).unwrap();

        let result = orchestrator
            .run_pipeline(request("service animal rules"))
            .await;

        assert_eq!(result.status, PipelineStatus::Completed);
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        let article = result.article.as_ref().unwrap();
        assert_eq!(article.slug, "service-animals-ada");
        assert!(result.fact_check.as_ref().unwrap().passed);
        assert!(result.llm_cost_usd > 0.0);
        assert_eq!(result.total_tokens, 3 * 200);

        // Run artifact and article markdown are written to disk.
        assert!(dir
            .path()
            .join("runs")
            .join(format!("{}.json", result.id))
            .exists());
        assert!(dir.path().join("articles/service-animals-ada.md").exists());
    }

    #[tokio::test]
    async fn test_generation_failure_fails_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            Orchestrator::new(StubProvider::failing(), config(dir.path())).unwrap();

        let result = orchestrator
            .run_pipeline(request("service animal rules"))
            .await;

        assert_eq!(result.status, PipelineStatus::Failed);
        assert!(result.article.is_none());
        assert!(result
            .errors
            .iter()
            .any(|e| e.starts_with("generation:")));
    }

    #[tokio::test]
    async fn test_failed_fact_check_marks_partial() {
        let dir = tempfile::tempdir().unwrap();
        let bad_body = format!(
            "{}\n\nYour service animal must be registered with the city first.",
            clean_body()
        );
        let provider = StubProvider::scripted(vec![outline_json(), bad_body, metadata_json()]);
        let orchestrator = Orchestrator::new(provider, config(dir.path())).unwrap();

        let result = orchestrator
            .run_pipeline(request("service animal rules"))
            .await;

        assert_eq!(result.status, PipelineStatus::Partial);
        assert!(result.article.is_some());
        assert!(!result.fact_check.as_ref().unwrap().passed);
        assert!(result.errors.iter().any(|e| e.starts_with("fact_check:")));
        assert!(result.publish.is_none());
    }

    #[tokio::test]
    async fn test_publish_without_publisher_marks_partial() {
        let dir = tempfile::tempdir().unwrap();
        let provider =
            StubProvider::scripted(vec![outline_json(), clean_body(), metadata_json()]);
        let orchestrator = Orchestrator::new(provider, config(dir.path())).unwrap();

        let mut req = request("service animal rules");
        req.publish = true;

        let result = orchestrator.run_pipeline(req).await;

        assert_eq!(result.status, PipelineStatus::Partial);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("publisher not configured")));
    }

    #[tokio::test]
    async fn test_topic_analysis_failure_is_fatal_without_requested_topic() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator =
            Orchestrator::new(StubProvider::failing(), config(dir.path())).unwrap();

        let result = orchestrator
            .run_pipeline(PipelineRequest {
                skip_scan: true,
                ..Default::default()
            })
            .await;

        assert_eq!(result.status, PipelineStatus::Failed);
        assert!(result.errors.iter().any(|e| e.starts_with("topics:")));
    }
}
