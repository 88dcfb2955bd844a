#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

//! # Pipeline
//!
//! The content pipeline: topic analysis, article generation, SEO lint,
//! legal fact checking, and the orchestrator that runs the five steps
//! in order.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pipeline::{Orchestrator, PipelineConfig, PipelineRequest};
//!
//! let provider = llm::ProviderRegistry::with_defaults()
//!     .get_configured()
//!     .expect("no provider configured");
//! let orchestrator = Orchestrator::new(provider, PipelineConfig::default())?;
//! let result = orchestrator.run_pipeline(PipelineRequest::default()).await;
//! ```

pub mod legal;
pub mod models;
pub mod orchestrator;
pub mod seo;
pub mod storage;
pub mod topics;
pub mod writer;

pub use legal::{ClaimFinding, FactCheckReport, FactChecker, FactTopic, Verdict};
pub use models::{
    count_words, slugify, ArticleOutline, GeneratedArticle, OutlineSection, PipelineStatus,
    SeoRequirements, TopicRecommendation,
};
pub use orchestrator::{Orchestrator, PipelineConfig, PipelineRequest, PipelineResult};
pub use seo::{audit, SeoAudit, SeoCheck, SeoViolation};
pub use storage::ArtifactStore;
pub use topics::{heuristic_recommendations, recommendation_for, TopicAnalyzer};
pub use writer::{cleanup_markdown, ArticleWriter};
