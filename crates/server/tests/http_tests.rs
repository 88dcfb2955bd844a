//! HTTP surface tests against a server bound to a random port.

use std::net::SocketAddr;
use std::sync::Arc;

use llm::AnthropicClient;
use pipeline::{Orchestrator, PipelineConfig};
use server::{build_router, AppState, Config};

/// Minimal state: no database, no vector search, no cache, a provider
/// that is configured but never called by these tests.
fn test_state(output_dir: &std::path::Path) -> AppState {
    let provider = Arc::new(AnthropicClient::new("sk-ant-test"));
    let pipeline_config = PipelineConfig {
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(provider, pipeline_config).unwrap();

    AppState {
        config: Arc::new(Config {
            port: 0,
            database_url: None,
            redis_url: None,
            wordpress: None,
            model: "claude-sonnet-4-20250514".to_string(),
            niche: "ADA compliance".to_string(),
            output_dir: output_dir.to_path_buf(),
            sites_file: None,
        }),
        orchestrator: Arc::new(orchestrator),
        store: None,
        vector: None,
        cache: None,
    }
}

async fn start_server(state: AppState) -> SocketAddr {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn health_endpoint_responds() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(test_state(dir.path())).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn ready_reports_disabled_features() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(test_state(dir.path())).await;

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/ready"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["database"], false);
    assert_eq!(body["vector"], false);
    assert_eq!(body["cache"], false);
}

#[tokio::test]
async fn vector_search_unavailable_without_database() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(test_state(dir.path())).await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/vector/search"))
        .json(&serde_json::json!({"query": "service animals"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn profiles_unavailable_without_database() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(test_state(dir.path())).await;

    let response = reqwest::get(format!("http://{addr}/profiles")).await.unwrap();
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn unknown_pipeline_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let addr = start_server(test_state(dir.path())).await;

    let response = reqwest::get(format!(
        "http://{addr}/pipeline/00000000-0000-0000-0000-000000000000"
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), 404);
}
