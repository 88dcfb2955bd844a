//! Shared application state.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;

use monitor::{CompetitorMonitor, CompetitorSite};
use pipeline::{Orchestrator, PipelineConfig};
use store::{CacheClient, EmbeddingsClient, Store, VectorStore};
use wordpress::{Publisher, WordPressClient, WpGraphqlClient};

use crate::config::Config;

/// Shared application state. Services are constructed once at startup
/// and injected; nothing global, nothing lazy.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,
    /// Pipeline orchestrator with its collaborators attached.
    pub orchestrator: Arc<Orchestrator>,
    /// Database store, when configured.
    pub store: Option<Store>,
    /// Vector search, when configured.
    pub vector: Option<Arc<VectorStore>>,
    /// Redis cache, when configured.
    pub cache: Option<CacheClient>,
}

impl AppState {
    /// Build the full service graph from configuration.
    pub async fn initialize(config: Config) -> Result<Self> {
        let provider = llm::ProviderRegistry::with_defaults()
            .for_model(&config.model)
            .filter(|p| p.is_configured())
            .or_else(|| llm::ProviderRegistry::with_defaults().get_configured())
            .ok_or_else(|| anyhow!("no LLM provider configured (set ANTHROPIC_API_KEY or OPENAI_API_KEY)"))?;

        let sites: Vec<CompetitorSite> = match &config.sites_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&content)?
            }
            None => Vec::new(),
        };

        let pipeline_config = PipelineConfig {
            niche: config.niche.clone(),
            model: config.model.clone(),
            output_dir: config.output_dir.clone(),
            sites,
            ..Default::default()
        };

        let mut orchestrator = Orchestrator::new(provider, pipeline_config)?;

        match CompetitorMonitor::from_env() {
            Ok(monitor) => orchestrator = orchestrator.with_monitor(monitor),
            Err(e) => tracing::info!(error = %e, "Scraper not configured, scan disabled"),
        }

        if let Some(wp) = &config.wordpress {
            let rest = WordPressClient::new(&wp.base_url, &wp.username, &wp.app_password)?;
            let publisher = if wp.use_graphql {
                let graphql = WpGraphqlClient::new(&wp.base_url, &wp.username, &wp.app_password)?;
                Publisher::new(rest).with_graphql(graphql)
            } else {
                Publisher::new(rest)
            };
            orchestrator = orchestrator.with_publisher(publisher);
        }

        let store = match &config.database_url {
            Some(url) => {
                let store = Store::connect(url).await.context("connecting to Postgres")?;
                store.init_schema().await?;
                Some(store)
            }
            None => None,
        };

        let vector = match (&store, EmbeddingsClient::from_env()) {
            (Some(store), Ok(embeddings)) => {
                Some(Arc::new(VectorStore::new(store.pool().clone(), embeddings)))
            }
            (Some(_), Err(e)) => {
                tracing::info!(error = %e, "Embeddings not configured, vector search disabled");
                None
            }
            (None, _) => None,
        };

        let cache = match &config.redis_url {
            Some(url) => Some(
                CacheClient::connect(url, "copydesk")
                    .await
                    .context("connecting to Redis")?,
            ),
            None => None,
        };

        if let Some(store) = &store {
            orchestrator = orchestrator.with_store(store.clone());
        }

        Ok(Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            store,
            vector,
            cache,
        })
    }
}
