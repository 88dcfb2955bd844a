#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]

//! # Store
//!
//! Persistence layer for the content pipeline:
//! - Postgres rows for articles, pipeline runs, API keys, competitor
//!   articles, and configuration profiles (sqlx)
//! - Vector search over content chunks (pgvector + OpenAI embeddings)
//! - Redis cache helper with JSON serialization

pub mod cache;
pub mod db;
pub mod error;
pub mod records;
pub mod vector;

pub use cache::CacheClient;
pub use db::Store;
pub use error::{StoreError, StoreResult};
pub use records::{
    ApiKeyRecord, ArticleRecord, CompetitorArticleRecord, NewArticle, PipelineRecord, ProfileRecord,
};
pub use vector::{chunk_text, ChunkMatch, EmbeddingsClient, VectorStore};
