//! Row types for the dashboard tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// A stored article.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ArticleRecord {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: String,
    pub word_count: i32,
    pub seo_score: i32,
    pub created_at: DateTime<Utc>,
}

/// Input for inserting an article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: String,
    pub word_count: i32,
    pub seo_score: i32,
}

/// A pipeline run row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PipelineRecord {
    pub id: Uuid,
    pub status: String,
    pub topic: Option<String>,
    pub article_id: Option<Uuid>,
    pub cost_usd: f64,
    pub total_tokens: i64,
    pub errors: Json<Vec<String>>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A registered API key (name + provider only; the key itself lives in
/// the environment).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApiKeyRecord {
    pub id: Uuid,
    pub name: String,
    pub provider: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// A scraped competitor article row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompetitorArticleRecord {
    pub id: Uuid,
    pub site: String,
    pub url: String,
    pub title: String,
    pub fetched_at: DateTime<Utc>,
}

/// A named configuration profile for pipeline runs.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub name: String,
    pub config: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
