//! Copydesk CLI - content-marketing automation pipeline.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use llm::{LlmProvider, ProviderRegistry};
use monitor::{CompetitorMonitor, CompetitorSite};
use pipeline::{
    FactChecker, Orchestrator, PipelineConfig, PipelineRequest, SeoRequirements,
};
use wordpress::{Publisher, WordPressClient};

/// Copydesk CLI - scan competitors, pick topics, write and check
/// articles, publish to WordPress.
#[derive(Parser)]
#[command(name = "copydesk")]
#[command(about = "Content-marketing automation pipeline")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline once
    Run {
        /// Topic to write about (otherwise the analyzer picks one)
        #[arg(long)]
        topic: Option<String>,

        /// Output directory for run artifacts
        #[arg(long, default_value = "./data")]
        output: PathBuf,

        /// JSON file with competitor sites ([{"name", "blog_url"}])
        #[arg(long)]
        sites: Option<PathBuf>,

        /// Model to use
        #[arg(long, default_value = "claude-sonnet-4-20250514")]
        model: String,

        /// Publish the result to WordPress
        #[arg(long)]
        publish: bool,

        /// Update an existing post with the same slug
        #[arg(long)]
        force_update: bool,

        /// Skip the competitor scan step
        #[arg(long)]
        skip_scan: bool,
    },

    /// Scan competitor blogs and print the keyword report
    Scan {
        /// JSON file with competitor sites
        #[arg(long)]
        sites: PathBuf,

        /// How many keywords to print
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Recommend article topics from the latest scan
    Topics {
        /// JSON file with competitor sites
        #[arg(long)]
        sites: Option<PathBuf>,

        /// Output directory (for the scan cache)
        #[arg(long, default_value = "./data")]
        output: PathBuf,

        /// How many topics to recommend
        #[arg(long, default_value = "5")]
        count: usize,

        /// Model to use
        #[arg(long, default_value = "claude-sonnet-4-20250514")]
        model: String,
    },

    /// Generate a single article without the rest of the pipeline
    Generate {
        /// Topic to write about
        topic: String,

        /// Target keyword (defaults to the topic)
        #[arg(long)]
        keyword: Option<String>,

        /// Output directory
        #[arg(long, default_value = "./data")]
        output: PathBuf,

        /// Model to use
        #[arg(long, default_value = "claude-sonnet-4-20250514")]
        model: String,
    },

    /// Run the legal and SEO checks over a local markdown file
    Audit {
        /// Markdown file to check
        file: PathBuf,

        /// Target keyword for the SEO lint
        #[arg(long, default_value = "")]
        keyword: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("pipeline=debug,monitor=debug,wordpress=debug,llm=debug,info")
    } else {
        EnvFilter::new("pipeline=info,monitor=info,wordpress=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            topic,
            output,
            sites,
            model,
            publish,
            force_update,
            skip_scan,
        } => run_pipeline(topic, output, sites, model, publish, force_update, skip_scan).await,
        Commands::Scan { sites, limit } => run_scan(&sites, limit).await,
        Commands::Topics {
            sites,
            output,
            count,
            model,
        } => run_topics(sites, output, count, model).await,
        Commands::Generate {
            topic,
            keyword,
            output,
            model,
        } => run_generate(&topic, keyword, output, model).await,
        Commands::Audit { file, keyword } => run_audit(&file, &keyword),
    }
}

fn provider_for(model: &str) -> Result<Arc<dyn LlmProvider>> {
    let registry = ProviderRegistry::with_defaults();
    registry
        .for_model(model)
        .filter(|p| p.is_configured())
        .or_else(|| registry.get_configured())
        .ok_or_else(|| anyhow::anyhow!("no LLM provider configured for model: {model}"))
}

fn load_sites(path: Option<&PathBuf>) -> Result<Vec<CompetitorSite>> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(Vec::new()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_pipeline(
    topic: Option<String>,
    output: PathBuf,
    sites: Option<PathBuf>,
    model: String,
    publish: bool,
    force_update: bool,
    skip_scan: bool,
) -> Result<()> {
    let provider = provider_for(&model)?;
    let sites = load_sites(sites.as_ref())?;

    let config = PipelineConfig {
        model,
        output_dir: output,
        sites,
        ..Default::default()
    };

    let mut orchestrator = Orchestrator::new(provider, config)?;

    if !skip_scan {
        match CompetitorMonitor::from_env() {
            Ok(monitor) => orchestrator = orchestrator.with_monitor(monitor),
            Err(e) => tracing::warn!(error = %e, "Scraper not available, scan step disabled"),
        }
    }

    if publish {
        orchestrator = orchestrator.with_publisher(publisher_from_env()?);
    }

    let result = orchestrator
        .run_pipeline(PipelineRequest {
            topic,
            seo: None,
            publish,
            force_update,
            skip_scan,
        })
        .await;

    println!("{} {}", "status:".bold(), result.status);
    if let Some(article) = &result.article {
        println!(
            "{} {} ({} words, SEO {})",
            "article:".bold(),
            article.slug,
            article.word_count,
            article.seo.score
        );
    }
    if let Some(report) = &result.fact_check {
        let line = format!(
            "accuracy {:.2}, {} incorrect",
            report.accuracy,
            report.incorrect_claims().len()
        );
        let line = if report.passed { line.green() } else { line.red() };
        println!("{} {line}", "fact check:".bold());
    }
    if let Some(outcome) = &result.publish {
        println!("{} {}", "published:".bold(), outcome.post().link);
    }
    for error in &result.errors {
        println!("{} {}", "error:".bold().red(), error);
    }
    println!(
        "{} ${:.4} over {} tokens",
        "cost:".bold(),
        result.llm_cost_usd,
        result.total_tokens
    );

    Ok(())
}

async fn run_scan(sites: &PathBuf, limit: usize) -> Result<()> {
    let sites: Vec<CompetitorSite> = load_sites(Some(sites))?;
    let monitor = CompetitorMonitor::from_env()?;
    let report = monitor.scan(&sites).await?;

    println!(
        "{} {} articles from {} sites",
        "scanned:".bold(),
        report.articles.len(),
        report.sites_scanned
    );
    for (keyword, count) in report.top_keywords(limit) {
        println!("  {keyword}: {count}");
    }
    for error in &report.errors {
        println!("{} {}", "error:".bold().red(), error);
    }
    Ok(())
}

async fn run_topics(
    sites: Option<PathBuf>,
    output: PathBuf,
    count: usize,
    model: String,
) -> Result<()> {
    let provider = provider_for(&model)?;
    let sites = load_sites(sites.as_ref())?;
    let has_sites = !sites.is_empty();

    let config = PipelineConfig {
        model,
        output_dir: output,
        sites,
        max_topics: count,
        ..Default::default()
    };
    let mut orchestrator = Orchestrator::new(provider, config)?;

    let scan = if has_sites {
        orchestrator = orchestrator.with_monitor(CompetitorMonitor::from_env()?);
        orchestrator.scan_competitors().await?
    } else {
        monitor::ScanReport::default()
    };

    let recommendations = orchestrator.analyze_topics(&scan).await?;
    for rec in recommendations {
        println!(
            "{} {:.0} {} ({} est. searches/mo, competition {:.2})",
            "topic:".bold(),
            rec.opportunity_score,
            rec.keyword,
            rec.estimated_monthly_searches,
            rec.competition
        );
        println!("  {}", rec.title_suggestion);
    }
    Ok(())
}

async fn run_generate(
    topic: &str,
    keyword: Option<String>,
    output: PathBuf,
    model: String,
) -> Result<()> {
    let provider = provider_for(&model)?;
    let config = PipelineConfig {
        model,
        output_dir: output.clone(),
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(provider, config)?;

    let seo = SeoRequirements::for_keyword(keyword.unwrap_or_else(|| topic.to_string()));
    let article = orchestrator.generate_article(topic, &seo).await?;

    let path = pipeline::ArtifactStore::new(&output).save_article(&article)?;
    println!(
        "{} {} ({} words, SEO {}) -> {}",
        "article:".bold(),
        article.slug,
        article.word_count,
        article.seo.score,
        path.display()
    );
    for violation in &article.seo.violations {
        println!("  {} {}", "lint:".yellow(), violation.message);
    }
    Ok(())
}

fn run_audit(file: &PathBuf, keyword: &str) -> Result<()> {
    let markdown = std::fs::read_to_string(file)?;

    let report = FactChecker::new().check(&markdown);
    println!(
        "{} accuracy {:.2}, {} claims, {} incorrect",
        "fact check:".bold(),
        report.accuracy,
        report.findings.len(),
        report.incorrect_claims().len()
    );
    for finding in report.incorrect_claims() {
        println!("  {} {}", "incorrect:".red(), finding.claim);
        if let Some(correction) = &finding.correction {
            println!("    {} {correction}", "fact:".green());
        }
    }

    if !keyword.is_empty() {
        let article = pipeline::GeneratedArticle {
            title: String::new(),
            slug: String::new(),
            content_markdown: markdown.clone(),
            meta_title: String::new(),
            meta_description: String::new(),
            tags: Vec::new(),
            primary_keyword: keyword.to_string(),
            word_count: pipeline::count_words(&markdown),
            seo: pipeline::SeoAudit::default(),
            model: String::new(),
            generated_at: chrono::Utc::now(),
        };
        let audit = pipeline::audit(&article, &SeoRequirements::for_keyword(keyword));
        println!("{} {}", "seo score:".bold(), audit.score);
        for violation in &audit.violations {
            println!("  {} {}", "lint:".yellow(), violation.message);
        }
    }
    Ok(())
}

fn publisher_from_env() -> Result<Publisher> {
    let base_url = std::env::var("WORDPRESS_URL")
        .map_err(|_| anyhow::anyhow!("WORDPRESS_URL not set"))?;
    let username = std::env::var("WORDPRESS_USERNAME")
        .map_err(|_| anyhow::anyhow!("WORDPRESS_USERNAME not set"))?;
    let app_password = std::env::var("WORDPRESS_APP_PASSWORD")
        .map_err(|_| anyhow::anyhow!("WORDPRESS_APP_PASSWORD not set"))?;

    let rest = WordPressClient::new(&base_url, &username, &app_password)?;
    Ok(Publisher::new(rest))
}
