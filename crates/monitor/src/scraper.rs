//! HTTP client for the markdown scraping service.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

const SCRAPER_API_BASE: &str = "https://api.firecrawl.dev/v1";

/// Options for scraping a URL.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Only extract main content (skip nav, footer, sidebars).
    pub only_main_content: bool,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            only_main_content: true,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A scraped page, reduced to what the monitor needs.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    /// Markdown rendering of the page content.
    pub markdown: String,
    /// Page title, when the service could extract one.
    pub title: Option<String>,
    /// Page meta description.
    pub description: Option<String>,
    /// Final URL after redirects.
    pub source_url: Option<String>,
    /// HTTP status of the origin fetch.
    pub status_code: Option<u16>,
}

impl ScrapedPage {
    /// Absolute links found in the markdown body.
    #[must_use]
    pub fn links(&self) -> Vec<String> {
        extract_links(&self.markdown)
    }

    /// Markdown headings (levels 1-3), in document order.
    #[must_use]
    pub fn headings(&self) -> Vec<String> {
        self.markdown
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim_start();
                let rest = trimmed
                    .strip_prefix("###")
                    .or_else(|| trimmed.strip_prefix("##"))
                    .or_else(|| trimmed.strip_prefix('#'))?;
                // A remaining '#' means the heading was deeper than H3.
                if rest.starts_with('#') {
                    return None;
                }
                let heading = rest.trim();
                (!heading.is_empty()).then(|| heading.to_string())
            })
            .collect()
    }
}

/// Extract absolute http(s) links from markdown link syntax.
#[must_use]
pub fn extract_links(markdown: &str) -> Vec<String> {
    static LINK_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = LINK_RE
        .get_or_init(|| regex::Regex::new(r"\[[^\]]*\]\((https?://[^)\s]+)\)").unwrap());

    let mut seen = std::collections::HashSet::new();
    re.captures_iter(markdown)
        .map(|cap| cap[1].to_string())
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Request body for the scrape endpoint.
#[derive(Debug, Serialize)]
struct ScrapeRequest {
    url: String,
    formats: Vec<String>,
    #[serde(rename = "onlyMainContent")]
    only_main_content: bool,
}

/// Response envelope from the scrape endpoint.
#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Deserialize)]
struct ScrapeMetadata {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "sourceURL")]
    source_url: Option<String>,
    #[serde(rename = "statusCode")]
    status_code: Option<u16>,
}

/// Client for the scraping service API.
pub struct ScrapeClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl ScrapeClient {
    /// Create a new scrape client.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: SCRAPER_API_BASE.to_string(),
            client,
        })
    }

    /// Create a client from the `SCRAPER_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key =
            std::env::var("SCRAPER_API_KEY").map_err(|_| anyhow!("SCRAPER_API_KEY not set"))?;
        Self::new(api_key)
    }

    /// Point the client at a different service endpoint.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Scrape a single URL into markdown.
    pub async fn scrape(&self, url: &str, options: &ScrapeOptions) -> Result<ScrapedPage> {
        let request = ScrapeRequest {
            url: url.to_string(),
            formats: vec!["markdown".to_string()],
            only_main_content: options.only_main_content,
        };

        let response = self
            .client
            .post(format!("{}/scrape", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(options.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| anyhow!("scrape request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".into());
            return Err(anyhow!("scraper API error ({status}): {error_text}"));
        }

        let envelope: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("failed to parse scraper response: {e}"))?;

        if !envelope.success {
            return Err(anyhow!(
                "scrape failed: {}",
                envelope.error.unwrap_or_else(|| "no error detail".into())
            ));
        }

        let data = envelope.data.ok_or_else(|| anyhow!("scrape returned no data"))?;
        let metadata = data.metadata;

        Ok(ScrapedPage {
            markdown: data.markdown.unwrap_or_default(),
            title: metadata.as_ref().and_then(|m| m.title.clone()),
            description: metadata.as_ref().and_then(|m| m.description.clone()),
            source_url: metadata.as_ref().and_then(|m| m.source_url.clone()),
            status_code: metadata.as_ref().and_then(|m| m.status_code),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_links_dedupes() {
        let markdown = "See [a](https://example.com/a) and [b](https://example.com/b) \
                        and [a again](https://example.com/a).";
        let links = extract_links(markdown);
        assert_eq!(
            links,
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[test]
    fn test_extract_links_ignores_relative() {
        let markdown = "[rel](/about) [abs](https://example.com/post)";
        assert_eq!(extract_links(markdown), vec!["https://example.com/post"]);
    }

    #[test]
    fn test_headings() {
        let page = ScrapedPage {
            markdown: "# Title\n\ntext\n\n## Section A\n\n### Detail\n\n#### too deep".to_string(),
            title: None,
            description: None,
            source_url: None,
            status_code: None,
        };
        assert_eq!(page.headings(), vec!["Title", "Section A", "Detail"]);
    }

    #[tokio::test]
    async fn test_scrape_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(
                serde_json::json!({"url": "https://example.com/blog"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {
                    "markdown": "# Blog\n\n[post](https://example.com/post-1)",
                    "metadata": {
                        "title": "Blog",
                        "sourceURL": "https://example.com/blog",
                        "statusCode": 200
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = ScrapeClient::new("test-key")
            .unwrap()
            .with_base_url(server.uri());

        let page = client
            .scrape("https://example.com/blog", &ScrapeOptions::default())
            .await
            .unwrap();

        assert_eq!(page.title.as_deref(), Some("Blog"));
        assert_eq!(page.links(), vec!["https://example.com/post-1"]);
    }

    #[tokio::test]
    async fn test_scrape_service_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scrape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "blocked by robots.txt"
            })))
            .mount(&server)
            .await;

        let client = ScrapeClient::new("test-key")
            .unwrap()
            .with_base_url(server.uri());

        let err = client
            .scrape("https://example.com", &ScrapeOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("robots.txt"));
    }
}
