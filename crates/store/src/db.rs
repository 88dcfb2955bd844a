//! Postgres connection and row operations.

use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::records::{
    ApiKeyRecord, ArticleRecord, CompetitorArticleRecord, NewArticle, PipelineRecord, ProfileRecord,
};

/// Idempotent schema, applied at startup.
const SCHEMA: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS vector",
    "CREATE TABLE IF NOT EXISTS articles (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE,
        content TEXT NOT NULL,
        meta_title TEXT,
        meta_description TEXT,
        status TEXT NOT NULL,
        word_count INTEGER NOT NULL DEFAULT 0,
        seo_score INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS pipelines (
        id UUID PRIMARY KEY,
        status TEXT NOT NULL,
        topic TEXT,
        article_id UUID REFERENCES articles(id),
        cost_usd DOUBLE PRECISION NOT NULL DEFAULT 0,
        total_tokens BIGINT NOT NULL DEFAULT 0,
        errors JSONB NOT NULL DEFAULT '[]',
        started_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        finished_at TIMESTAMPTZ
    )",
    "CREATE TABLE IF NOT EXISTS api_keys (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        provider TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        last_used_at TIMESTAMPTZ
    )",
    "CREATE TABLE IF NOT EXISTS competitor_articles (
        id UUID PRIMARY KEY,
        site TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        fetched_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS profiles (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        config JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS content_chunks (
        id UUID PRIMARY KEY,
        document_id TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        metadata JSONB NOT NULL DEFAULT '{}',
        embedding vector(1536)
    )",
    "CREATE INDEX IF NOT EXISTS content_chunks_document_idx ON content_chunks (document_id)",
];

/// Handle to the Postgres-backed dashboard store.
#[derive(Debug, Clone)]
pub struct Store {
    pool: PgPool,
}

impl Store {
    /// Connect to Postgres.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Apply the idempotent schema.
    pub async fn init_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema ready");
        Ok(())
    }

    /// The underlying pool, shared with the vector store.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -- articles --

    /// Insert an article, returning the stored row.
    pub async fn insert_article(&self, article: &NewArticle) -> StoreResult<ArticleRecord> {
        let row = sqlx::query_as::<_, ArticleRecord>(
            "INSERT INTO articles
                (id, title, slug, content, meta_title, meta_description, status, word_count, seo_score)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(&article.meta_title)
        .bind(&article.meta_description)
        .bind(&article.status)
        .bind(article.word_count)
        .bind(article.seo_score)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Look up an article by slug.
    pub async fn get_article_by_slug(&self, slug: &str) -> StoreResult<Option<ArticleRecord>> {
        let row = sqlx::query_as::<_, ArticleRecord>("SELECT * FROM articles WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Most recent articles.
    pub async fn list_articles(&self, limit: i64) -> StoreResult<Vec<ArticleRecord>> {
        let rows = sqlx::query_as::<_, ArticleRecord>(
            "SELECT * FROM articles ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -- pipelines --

    /// Record the start of a pipeline run.
    pub async fn create_pipeline(&self, id: Uuid, topic: Option<&str>) -> StoreResult<()> {
        sqlx::query("INSERT INTO pipelines (id, status, topic) VALUES ($1, 'running', $2)")
            .bind(id)
            .bind(topic)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Record the completion of a pipeline run.
    #[allow(clippy::too_many_arguments)]
    pub async fn finish_pipeline(
        &self,
        id: Uuid,
        status: &str,
        article_id: Option<Uuid>,
        cost_usd: f64,
        total_tokens: i64,
        errors: &[String],
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE pipelines
             SET status = $2, article_id = $3, cost_usd = $4, total_tokens = $5,
                 errors = $6, finished_at = $7
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(article_id)
        .bind(cost_usd)
        .bind(total_tokens)
        .bind(Json(errors.to_vec()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Look up a pipeline run.
    pub async fn get_pipeline(&self, id: Uuid) -> StoreResult<Option<PipelineRecord>> {
        let row = sqlx::query_as::<_, PipelineRecord>("SELECT * FROM pipelines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Most recent pipeline runs.
    pub async fn list_pipelines(&self, limit: i64) -> StoreResult<Vec<PipelineRecord>> {
        let rows = sqlx::query_as::<_, PipelineRecord>(
            "SELECT * FROM pipelines ORDER BY started_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -- competitor articles --

    /// Insert or refresh a competitor article, keyed by URL.
    pub async fn upsert_competitor_article(
        &self,
        site: &str,
        url: &str,
        title: &str,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO competitor_articles (id, site, url, title, fetched_at)
             VALUES ($1, $2, $3, $4, now())
             ON CONFLICT (url) DO UPDATE SET title = EXCLUDED.title, fetched_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(site)
        .bind(url)
        .bind(title)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Most recently fetched competitor articles.
    pub async fn list_competitor_articles(
        &self,
        limit: i64,
    ) -> StoreResult<Vec<CompetitorArticleRecord>> {
        let rows = sqlx::query_as::<_, CompetitorArticleRecord>(
            "SELECT * FROM competitor_articles ORDER BY fetched_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // -- profiles --

    /// Create a configuration profile.
    pub async fn create_profile(
        &self,
        name: &str,
        config: serde_json::Value,
    ) -> StoreResult<ProfileRecord> {
        let row = sqlx::query_as::<_, ProfileRecord>(
            "INSERT INTO profiles (id, name, config) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Json(config))
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Look up a profile by ID.
    pub async fn get_profile(&self, id: Uuid) -> StoreResult<Option<ProfileRecord>> {
        let row = sqlx::query_as::<_, ProfileRecord>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// All profiles, alphabetical.
    pub async fn list_profiles(&self) -> StoreResult<Vec<ProfileRecord>> {
        let rows = sqlx::query_as::<_, ProfileRecord>("SELECT * FROM profiles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Replace a profile's config (and optionally rename it).
    pub async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        config: serde_json::Value,
    ) -> StoreResult<ProfileRecord> {
        let row = sqlx::query_as::<_, ProfileRecord>(
            "UPDATE profiles
             SET name = COALESCE($2, name), config = $3, updated_at = now()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(Json(config))
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::NotFound(format!("profile {id}")))
    }

    /// Delete a profile. Returns whether a row was removed.
    pub async fn delete_profile(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- api keys --

    /// Register an API key name (the secret itself stays in the env).
    pub async fn insert_api_key(&self, name: &str, provider: &str) -> StoreResult<ApiKeyRecord> {
        let row = sqlx::query_as::<_, ApiKeyRecord>(
            "INSERT INTO api_keys (id, name, provider) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(provider)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// All registered API keys.
    pub async fn list_api_keys(&self) -> StoreResult<Vec<ApiKeyRecord>> {
        let rows = sqlx::query_as::<_, ApiKeyRecord>("SELECT * FROM api_keys ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Stamp an API key as used.
    pub async fn touch_api_key(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
