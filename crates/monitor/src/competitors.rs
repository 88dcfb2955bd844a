//! Competitor blog scanning and keyword aggregation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

use crate::scraper::{ScrapeClient, ScrapeOptions, ScrapedPage};

/// Path fragments that mark non-article links (nav, archives, utility pages).
const SKIP_PATH_FRAGMENTS: &[&str] = &[
    "/tag/",
    "/tags/",
    "/category/",
    "/categories/",
    "/author/",
    "/page/",
    "/about",
    "/contact",
    "/privacy",
    "/terms",
    "/search",
    "/feed",
    "/rss",
    "/sitemap",
    "/login",
    "/signup",
    "/cart",
];

/// Words excluded from keyword aggregation.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "your", "what", "when", "where", "how",
    "why", "are", "was", "were", "will", "can", "could", "should", "would", "have", "has", "had",
    "into", "about", "them", "they", "their", "there", "here", "more", "most", "some", "such",
    "than", "then", "these", "those", "you", "our", "not", "but", "all", "any", "its", "also",
    "best", "guide", "tips", "complete", "ultimate",
];

/// A competitor site to monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorSite {
    /// Display name.
    pub name: String,
    /// Blog index URL.
    pub blog_url: String,
}

/// One scraped competitor article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorArticle {
    /// Site the article came from.
    pub site: String,
    /// Article URL.
    pub url: String,
    /// Article title.
    pub title: String,
    /// Meta description, when present.
    pub summary: Option<String>,
    /// Section headings from the article body.
    pub headings: Vec<String>,
    /// When the article was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Aggregated result of one competitor scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// When the scan ran.
    pub scanned_at: Option<DateTime<Utc>>,
    /// Number of sites scanned (including failed ones).
    pub sites_scanned: usize,
    /// All articles fetched.
    pub articles: Vec<CompetitorArticle>,
    /// Keyword frequency across titles and headings.
    pub keyword_frequency: HashMap<String, usize>,
    /// Per-site errors; a failed site never aborts the scan.
    pub errors: Vec<String>,
}

impl ScanReport {
    /// The `n` most frequent keywords, ties broken alphabetically for
    /// stable output.
    #[must_use]
    pub fn top_keywords(&self, n: usize) -> Vec<(String, usize)> {
        let mut entries: Vec<_> = self
            .keyword_frequency
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }

    /// Articles fetched from one site.
    #[must_use]
    pub fn articles_for(&self, site: &str) -> Vec<&CompetitorArticle> {
        self.articles.iter().filter(|a| a.site == site).collect()
    }

    /// Whether any competitor title contains the keyword (case-insensitive).
    #[must_use]
    pub fn title_mentions(&self, keyword: &str) -> usize {
        let needle = keyword.to_lowercase();
        self.articles
            .iter()
            .filter(|a| a.title.to_lowercase().contains(&needle))
            .count()
    }
}

/// Configuration for the monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Maximum articles to fetch per site.
    pub max_articles_per_site: usize,
    /// Scrape options applied to every fetch.
    pub scrape: ScrapeOptions,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_articles_per_site: 5,
            scrape: ScrapeOptions::default(),
        }
    }
}

/// Scans competitor blogs and aggregates what they write about.
pub struct CompetitorMonitor {
    scraper: ScrapeClient,
    config: MonitorConfig,
}

impl CompetitorMonitor {
    /// Create a new monitor.
    #[must_use]
    pub fn new(scraper: ScrapeClient, config: MonitorConfig) -> Self {
        Self { scraper, config }
    }

    /// Create from environment with default configuration.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ScrapeClient::from_env()?, MonitorConfig::default()))
    }

    /// Scan all sites, collecting articles and keyword frequencies.
    pub async fn scan(&self, sites: &[CompetitorSite]) -> Result<ScanReport> {
        let mut report = ScanReport {
            scanned_at: Some(Utc::now()),
            sites_scanned: sites.len(),
            ..Default::default()
        };

        for site in sites {
            tracing::info!(site = %site.name, url = %site.blog_url, "Scanning competitor");
            match self.scan_site(site).await {
                Ok(mut articles) => {
                    tracing::info!(site = %site.name, count = articles.len(), "Site scan complete");
                    report.articles.append(&mut articles);
                }
                Err(e) => {
                    tracing::warn!(site = %site.name, error = %e, "Site scan failed");
                    report.errors.push(format!("{}: {e}", site.name));
                }
            }
        }

        report.keyword_frequency = aggregate_keywords(&report.articles);

        tracing::info!(
            sites = report.sites_scanned,
            articles = report.articles.len(),
            keywords = report.keyword_frequency.len(),
            errors = report.errors.len(),
            "Competitor scan complete"
        );

        Ok(report)
    }

    /// Scan one site: fetch the blog index, pick article links, fetch each.
    async fn scan_site(&self, site: &CompetitorSite) -> Result<Vec<CompetitorArticle>> {
        let index = self.scraper.scrape(&site.blog_url, &self.config.scrape).await?;

        let candidates = article_candidates(&site.blog_url, &index.links());
        let mut articles = Vec::new();

        for url in candidates.into_iter().take(self.config.max_articles_per_site) {
            match self.scraper.scrape(&url, &self.config.scrape).await {
                Ok(page) => articles.push(to_article(site, &url, &page)),
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Article fetch failed");
                }
            }
        }

        Ok(articles)
    }
}

/// Build a `CompetitorArticle` from a scraped page.
fn to_article(site: &CompetitorSite, url: &str, page: &ScrapedPage) -> CompetitorArticle {
    let title = page
        .title
        .clone()
        .or_else(|| page.headings().into_iter().next())
        .unwrap_or_else(|| url.to_string());

    CompetitorArticle {
        site: site.name.clone(),
        url: url.to_string(),
        title,
        summary: page.description.clone(),
        headings: page.headings(),
        fetched_at: Utc::now(),
    }
}

/// Filter index links down to likely article URLs: same host as the blog,
/// not in the skip list, not the index itself.
fn article_candidates(blog_url: &str, links: &[String]) -> Vec<String> {
    let Ok(base) = Url::parse(blog_url) else {
        return Vec::new();
    };
    let base_host = base.host_str().unwrap_or_default().to_string();

    links
        .iter()
        .filter(|link| {
            let Ok(parsed) = Url::parse(link) else {
                return false;
            };
            if parsed.host_str() != Some(base_host.as_str()) {
                return false;
            }
            let path = parsed.path().to_lowercase();
            if path == base.path().to_lowercase() || path == "/" {
                return false;
            }
            !SKIP_PATH_FRAGMENTS.iter().any(|frag| path.contains(frag))
        })
        .cloned()
        .collect()
}

/// Count keyword frequency across article titles and headings.
fn aggregate_keywords(articles: &[CompetitorArticle]) -> HashMap<String, usize> {
    let mut frequency: HashMap<String, usize> = HashMap::new();

    for article in articles {
        let mut text = article.title.clone();
        for heading in &article.headings {
            text.push(' ');
            text.push_str(heading);
        }

        for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if word.len() <= 3 || STOPWORDS.contains(&word) || word.chars().all(char::is_numeric) {
                continue;
            }
            *frequency.entry(word.to_string()).or_insert(0) += 1;
        }
    }

    frequency
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(site: &str, title: &str, headings: &[&str]) -> CompetitorArticle {
        CompetitorArticle {
            site: site.to_string(),
            url: format!("https://{site}.example.com/post"),
            title: title.to_string(),
            summary: None,
            headings: headings.iter().map(ToString::to_string).collect(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_article_candidates_filters() {
        let links = vec![
            "https://acme.com/blog/service-animals-guide".to_string(),
            "https://acme.com/blog/tag/ada".to_string(),
            "https://other.com/blog/post".to_string(),
            "https://acme.com/blog".to_string(),
            "https://acme.com/about".to_string(),
            "https://acme.com/blog/ada-tax-credit".to_string(),
        ];
        let candidates = article_candidates("https://acme.com/blog", &links);
        assert_eq!(
            candidates,
            vec![
                "https://acme.com/blog/service-animals-guide",
                "https://acme.com/blog/ada-tax-credit"
            ]
        );
    }

    #[test]
    fn test_aggregate_keywords_skips_stopwords() {
        let articles = vec![
            article("a", "Service Animals and the ADA", &["Service Dog Rules"]),
            article("b", "Service Animal Registration Myths", &[]),
        ];
        let frequency = aggregate_keywords(&articles);

        assert_eq!(frequency["service"], 3);
        assert!(!frequency.contains_key("the"));
        assert!(!frequency.contains_key("and"));
        // "ada" is only 3 chars, below the length cutoff
        assert!(!frequency.contains_key("ada"));
    }

    #[test]
    fn test_top_keywords_stable_order() {
        let mut report = ScanReport::default();
        report.keyword_frequency.insert("animals".to_string(), 4);
        report.keyword_frequency.insert("service".to_string(), 4);
        report.keyword_frequency.insert("accessibility".to_string(), 9);

        let top = report.top_keywords(2);
        assert_eq!(top[0].0, "accessibility");
        // Tie between "animals" and "service" breaks alphabetically
        assert_eq!(top[1].0, "animals");
    }

    #[test]
    fn test_title_mentions() {
        let mut report = ScanReport::default();
        report.articles = vec![
            article("a", "Service Animal Laws Explained", &[]),
            article("b", "Web Accessibility Basics", &[]),
        ];
        assert_eq!(report.title_mentions("service animal"), 1);
        assert_eq!(report.title_mentions("restaurant"), 0);
    }
}
