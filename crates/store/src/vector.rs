//! Vector search over article content, backed by pgvector.
//!
//! Chunks text, embeds chunks through the OpenAI embeddings API, and
//! upserts/searches a `vector` column. Similarity math and indexing are
//! pgvector's job; this module only shapes data in and out.

use pgvector::Vector;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

const EMBEDDINGS_API_URL: &str = "https://api.openai.com/v1/embeddings";

/// Embedding model; its dimension must match the `vector(1536)` column.
const EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default chunking: ~220 words per chunk with 40 words of overlap.
const CHUNK_WORDS: usize = 220;
const CHUNK_OVERLAP: usize = 40;

/// Split text into overlapping word windows.
#[must_use]
pub fn chunk_text(text: &str, max_words: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    if words.len() <= max_words {
        return vec![words.join(" ")];
    }

    let step = max_words.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + max_words).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }
    chunks
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for the OpenAI embeddings API.
pub struct EmbeddingsClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl EmbeddingsClient {
    /// Create a client with an API key.
    pub fn new(api_key: impl Into<String>) -> StoreResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: EMBEDDINGS_API_URL.to_string(),
            model: EMBEDDING_MODEL.to_string(),
        })
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> StoreResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| StoreError::Embedding("OPENAI_API_KEY not set".to_string()))?;
        Self::new(api_key)
    }

    /// Point the client at a different endpoint.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Embed a batch of texts, preserving input order.
    pub async fn embed(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Embedding(format!(
                "embeddings API error ({status}): {body}"
            )));
        }

        let mut parsed: EmbeddingsResponse = response.json().await?;
        if parsed.data.len() != texts.len() {
            return Err(StoreError::Embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        parsed.data.sort_by_key(|row| row.index);
        Ok(parsed.data.into_iter().map(|row| row.embedding).collect())
    }
}

/// A search hit.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChunkMatch {
    pub document_id: String,
    pub chunk_index: i32,
    pub content: String,
    pub metadata: Json<Value>,
    /// Cosine similarity in [0, 1] (1 = identical direction).
    pub score: f64,
}

/// Vector index over content chunks.
pub struct VectorStore {
    pool: PgPool,
    embeddings: EmbeddingsClient,
}

impl VectorStore {
    /// Create a vector store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool, embeddings: EmbeddingsClient) -> Self {
        Self { pool, embeddings }
    }

    /// Index a document: chunk, embed, and replace its stored chunks.
    ///
    /// Returns the number of chunks written. Empty text clears the
    /// document's chunks and indexes nothing.
    pub async fn index_document(
        &self,
        document_id: &str,
        text: &str,
        metadata: Value,
    ) -> StoreResult<usize> {
        let chunks = chunk_text(text, CHUNK_WORDS, CHUNK_OVERLAP);

        sqlx::query("DELETE FROM content_chunks WHERE document_id = $1")
            .bind(document_id)
            .execute(&self.pool)
            .await?;

        if chunks.is_empty() {
            return Ok(0);
        }

        let vectors = self.embeddings.embed(&chunks).await?;

        for (index, (content, embedding)) in chunks.iter().zip(vectors).enumerate() {
            sqlx::query(
                "INSERT INTO content_chunks (id, document_id, chunk_index, content, metadata, embedding)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(document_id)
            .bind(i32::try_from(index).unwrap_or(i32::MAX))
            .bind(content)
            .bind(Json(metadata.clone()))
            .bind(Vector::from(embedding))
            .execute(&self.pool)
            .await?;
        }

        tracing::info!(document_id, chunks = chunks.len(), "Indexed document");
        Ok(chunks.len())
    }

    /// Search for the `limit` chunks nearest to the query.
    pub async fn search(&self, query: &str, limit: i64) -> StoreResult<Vec<ChunkMatch>> {
        let mut vectors = self.embeddings.embed(&[query.to_string()]).await?;
        let query_vector = Vector::from(vectors.remove(0));

        let rows = sqlx::query_as::<_, ChunkMatch>(
            "SELECT document_id, chunk_index, content, metadata,
                    1 - (embedding <=> $1) AS score
             FROM content_chunks
             ORDER BY embedding <=> $1
             LIMIT $2",
        )
        .bind(query_vector)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_chunk_short_text_single_chunk() {
        let chunks = chunk_text("one two three", 220, 40);
        assert_eq!(chunks, vec!["one two three"]);
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("   ", 220, 40).is_empty());
    }

    #[test]
    fn test_chunk_overlap() {
        let words: Vec<String> = (0..10).map(|i| format!("w{i}")).collect();
        let text = words.join(" ");
        let chunks = chunk_text(&text, 4, 2);

        // Windows of 4 advancing by 2: [0..4], [2..6], [4..8], [6..10]
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], "w0 w1 w2 w3");
        assert_eq!(chunks[1], "w2 w3 w4 w5");
        assert_eq!(chunks[3], "w6 w7 w8 w9");
    }

    #[test]
    fn test_chunk_covers_all_words() {
        let words: Vec<String> = (0..503).map(|i| format!("w{i}")).collect();
        let chunks = chunk_text(&words.join(" "), 220, 40);
        assert!(chunks.last().unwrap().contains("w502"));
    }

    #[tokio::test]
    async fn test_embed_preserves_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"index": 1, "embedding": [0.2, 0.2]},
                    {"index": 0, "embedding": [0.1, 0.1]}
                ]
            })))
            .mount(&server)
            .await;

        let client = EmbeddingsClient::new("sk-test")
            .unwrap()
            .with_base_url(format!("{}/v1/embeddings", server.uri()));

        let vectors = client
            .embed(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors[0], vec![0.1, 0.1]);
        assert_eq!(vectors[1], vec![0.2, 0.2]);
    }

    #[tokio::test]
    async fn test_embed_empty_batch_skips_call() {
        let client = EmbeddingsClient::new("sk-test").unwrap();
        let vectors = client.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
