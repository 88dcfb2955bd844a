//! HTTP routes for the dashboard.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use pipeline::{ArtifactStore, PipelineRequest, SeoRequirements};

use crate::profiles;
use crate::state::AppState;

/// Error responses carry a JSON body alongside the status code.
pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({"status": "error", "error": message.into()})))
}

/// Build the HTTP router for the dashboard.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Pipeline
        .route("/pipeline/run", post(run_pipeline))
        .route("/pipeline/{id}", get(pipeline_status))
        .route("/pipelines", get(list_pipelines))
        // Individual steps
        .route("/competitors/scan", post(scan_competitors))
        .route("/competitors/articles", get(list_competitor_articles))
        .route("/article/generate", post(generate_article))
        .route("/articles", get(list_articles))
        // Vector search
        .route("/vector/index", post(vector_index))
        .route("/vector/search", post(vector_search))
        // Cost tracking
        .route("/usage", get(usage))
        // API key registry
        .route("/keys", get(list_keys).post(register_key))
        // Configuration profiles
        .route("/profiles", get(profiles::list).post(profiles::create))
        .route(
            "/profiles/{id}",
            get(profiles::get_one)
                .put(profiles::update)
                .delete(profiles::delete),
        )
        // Health checks
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn ready(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "database": state.store.is_some(),
        "vector": state.vector.is_some(),
        "cache": state.cache.is_some(),
    }))
}

/// Kick off a pipeline run in the background and hand back the run ID.
async fn run_pipeline(
    State(state): State<AppState>,
    Json(request): Json<PipelineRequest>,
) -> Json<Value> {
    let id = Uuid::new_v4();
    let orchestrator = state.orchestrator.clone();

    tracing::info!(pipeline_id = %id, topic = ?request.topic, "Pipeline run accepted");

    tokio::spawn(async move {
        orchestrator.run_with_id(id, request).await;
    });

    Json(json!({"status": "accepted", "pipeline_id": id}))
}

/// Status for one run, from the database or the run artifact.
async fn pipeline_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    if let Some(store) = &state.store {
        match store.get_pipeline(id).await {
            Ok(Some(record)) => return Ok(Json(json!(record))),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "Failed to load pipeline row");
                return Err(error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()));
            }
        }
    }

    let artifacts = ArtifactStore::new(&state.config.output_dir);
    match artifacts.load_result(id) {
        Ok(result) => Ok(Json(json!(result))),
        Err(_) => Err(error(StatusCode::NOT_FOUND, format!("pipeline {id} not found"))),
    }
}

async fn list_pipelines(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "database not configured"))?;

    let pipelines = store.list_pipelines(50).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to list pipelines");
        error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(Json(json!({"pipelines": pipelines})))
}

/// Synchronous competitor scan, cached in Redis when available.
async fn scan_competitors(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    const CACHE_KEY: &str = "scan:latest";

    if let Some(cache) = &state.cache {
        match cache.get_json::<monitor::ScanReport>(CACHE_KEY).await {
            Ok(Some(report)) => {
                tracing::debug!("Serving competitor scan from cache");
                return Ok(Json(json!(report)));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Cache read failed"),
        }
    }

    let report = state
        .orchestrator
        .scan_competitors()
        .await
        .map_err(|e| error(StatusCode::BAD_GATEWAY, e.to_string()))?;

    if let Some(cache) = &state.cache {
        if let Err(e) = cache
            .set_json(CACHE_KEY, &report, Duration::from_secs(3600))
            .await
        {
            tracing::warn!(error = %e, "Cache write failed");
        }
    }

    Ok(Json(json!(report)))
}

/// Competitor articles persisted by past scans.
async fn list_competitor_articles(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "database not configured"))?;

    let articles = store
        .list_competitor_articles(100)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(json!({"articles": articles})))
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    topic: String,
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default)]
    min_words: Option<usize>,
    #[serde(default)]
    max_words: Option<usize>,
}

async fn generate_article(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut seo =
        SeoRequirements::for_keyword(request.keyword.unwrap_or_else(|| request.topic.clone()));
    if let Some(min_words) = request.min_words {
        seo.min_words = min_words;
    }
    if let Some(max_words) = request.max_words {
        seo.max_words = max_words;
    }

    let article = state
        .orchestrator
        .generate_article(&request.topic, &seo)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Article generation failed");
            error(StatusCode::BAD_GATEWAY, e.to_string())
        })?;

    Ok(Json(json!(article)))
}

async fn list_articles(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "database not configured"))?;

    let articles = store
        .list_articles(50)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(json!({"articles": articles})))
}

#[derive(Debug, Deserialize)]
struct IndexRequest {
    document_id: String,
    text: String,
    #[serde(default)]
    metadata: Value,
}

async fn vector_index(
    State(state): State<AppState>,
    Json(request): Json<IndexRequest>,
) -> Result<Json<Value>, ApiError> {
    let vector = state
        .vector
        .as_ref()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "vector search not configured"))?;

    let chunks = vector
        .index_document(&request.document_id, &request.text, request.metadata)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Indexing failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(json!({"status": "ok", "chunks": chunks})))
}

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default = "default_search_limit")]
    limit: i64,
}

fn default_search_limit() -> i64 {
    10
}

async fn vector_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<Value>, ApiError> {
    let vector = state
        .vector
        .as_ref()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "vector search not configured"))?;

    let matches = vector
        .search(&request.query, request.limit.clamp(1, 50))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Search failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(json!({"matches": matches})))
}

#[derive(Debug, Deserialize)]
struct RegisterKeyRequest {
    name: String,
    provider: String,
}

/// Register an API key by name. The secret itself stays in the
/// environment; the row only tracks which keys exist and when they were
/// last used.
async fn register_key(
    State(state): State<AppState>,
    Json(request): Json<RegisterKeyRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "database not configured"))?;

    let key = store
        .insert_api_key(&request.name, &request.provider)
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok((StatusCode::CREATED, Json(json!(key))))
}

async fn list_keys(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| error(StatusCode::SERVICE_UNAVAILABLE, "database not configured"))?;

    let keys = store
        .list_api_keys()
        .await
        .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(json!({"keys": keys})))
}

async fn usage(State(state): State<AppState>) -> Json<Value> {
    let tracker = state.orchestrator.tracker();
    Json(json!({
        "total_cost_usd": tracker.total_cost_usd(),
        "total_tokens": tracker.total_tokens(),
        "by_step": tracker.by_step(),
    }))
}
