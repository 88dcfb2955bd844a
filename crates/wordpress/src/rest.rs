//! WordPress REST API client (`/wp-json/wp/v2`).

use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::error::{PublishError, PublishResult};
use crate::types::{PostStatus, PublishRequest, WpPost};

/// Row shape returned by the posts endpoints. WordPress wraps rendered
/// fields in `{ "rendered": ... }` objects.
#[derive(Debug, Deserialize)]
struct PostRow {
    id: u64,
    slug: String,
    link: String,
    status: String,
}

/// Row shape for terms (categories and tags).
#[derive(Debug, Deserialize)]
struct TermRow {
    id: u64,
}

/// Error body shape from the REST API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    code: Option<String>,
    message: Option<String>,
}

/// Payload for creating or updating a post.
#[derive(Debug, Serialize)]
struct PostPayload<'a> {
    title: &'a str,
    slug: &'a str,
    content: &'a str,
    status: PostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    excerpt: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    categories: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<u64>,
}

/// A freshly uploaded media item.
#[derive(Debug, Clone, Deserialize)]
pub struct WpMedia {
    /// Attachment ID.
    pub id: u64,
    /// Public URL of the uploaded file.
    pub source_url: String,
}

/// WordPress REST API client with application-password auth.
pub struct WordPressClient {
    base_url: String,
    auth_header: String,
    client: Client,
}

impl WordPressClient {
    /// Create a client for a WordPress installation.
    ///
    /// `base_url` is the site root (e.g. `https://example.com`);
    /// credentials are a username plus an application password.
    pub fn new(
        base_url: impl Into<String>,
        username: &str,
        app_password: &str,
    ) -> PublishResult<Self> {
        let credentials =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{app_password}"));
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_header: format!("Basic {credentials}"),
            client,
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}/wp-json/wp/v2{path}", self.base_url)
    }

    /// Look up a post by slug. Returns `None` when the slug is unused.
    pub async fn find_post_by_slug(&self, slug: &str) -> PublishResult<Option<WpPost>> {
        let response = self
            .client
            .get(self.api("/posts"))
            .query(&[("slug", slug), ("status", "publish,draft,pending")])
            .header("Authorization", &self.auth_header)
            .send()
            .await?;

        let rows: Vec<PostRow> = Self::parse(response).await?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    /// Create a new post.
    pub async fn create_post(
        &self,
        request: &PublishRequest,
        category_ids: Vec<u64>,
        tag_ids: Vec<u64>,
    ) -> PublishResult<WpPost> {
        let payload = PostPayload {
            title: &request.title,
            slug: &request.slug,
            content: &request.content_html,
            status: request.status,
            excerpt: request.excerpt.as_deref(),
            categories: category_ids,
            tags: tag_ids,
        };

        tracing::info!(slug = %request.slug, "Creating WordPress post");

        let response = self
            .client
            .post(self.api("/posts"))
            .header("Authorization", &self.auth_header)
            .json(&payload)
            .send()
            .await?;

        let row: PostRow = Self::parse(response).await?;
        Ok(row.into())
    }

    /// Update an existing post in place.
    pub async fn update_post(
        &self,
        post_id: u64,
        request: &PublishRequest,
        category_ids: Vec<u64>,
        tag_ids: Vec<u64>,
    ) -> PublishResult<WpPost> {
        let payload = PostPayload {
            title: &request.title,
            slug: &request.slug,
            content: &request.content_html,
            status: request.status,
            excerpt: request.excerpt.as_deref(),
            categories: category_ids,
            tags: tag_ids,
        };

        tracing::info!(post_id, slug = %request.slug, "Updating WordPress post");

        let response = self
            .client
            .post(self.api(&format!("/posts/{post_id}")))
            .header("Authorization", &self.auth_header)
            .json(&payload)
            .send()
            .await?;

        let row: PostRow = Self::parse(response).await?;
        Ok(row.into())
    }

    /// Upload a media file, returning its attachment.
    pub async fn upload_media(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> PublishResult<WpMedia> {
        let response = self
            .client
            .post(self.api("/media"))
            .header("Authorization", &self.auth_header)
            .header("Content-Type", content_type)
            .header(
                "Content-Disposition",
                format!("attachment; filename=\"{filename}\""),
            )
            .body(bytes)
            .send()
            .await?;

        Self::parse(response).await
    }

    /// Resolve a category to its term ID, creating it when missing.
    pub async fn ensure_category(&self, name: &str) -> PublishResult<u64> {
        self.ensure_term("/categories", name).await
    }

    /// Resolve a tag to its term ID, creating it when missing.
    pub async fn ensure_tag(&self, name: &str) -> PublishResult<u64> {
        self.ensure_term("/tags", name).await
    }

    async fn ensure_term(&self, endpoint: &str, name: &str) -> PublishResult<u64> {
        let slug = term_slug(name);

        let response = self
            .client
            .get(self.api(endpoint))
            .query(&[("slug", slug.as_str())])
            .header("Authorization", &self.auth_header)
            .send()
            .await?;

        let existing: Vec<TermRow> = Self::parse(response).await?;
        if let Some(term) = existing.into_iter().next() {
            return Ok(term.id);
        }

        tracing::debug!(term = %name, endpoint, "Creating WordPress term");

        let response = self
            .client
            .post(self.api(endpoint))
            .header("Authorization", &self.auth_header)
            .json(&json!({"name": name, "slug": slug}))
            .send()
            .await?;

        let created: TermRow = Self::parse(response).await?;
        Ok(created.id)
    }

    /// Parse a REST response, mapping error statuses to typed errors.
    async fn parse<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> PublishResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(PublishError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

impl From<PostRow> for WpPost {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            link: row.link,
            status: row.status,
        }
    }
}

/// Slugify a term name for lookup and creation.
fn term_slug(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_slug() {
        assert_eq!(term_slug("ADA Compliance"), "ada-compliance");
        assert_eq!(term_slug("Service Animals!"), "service-animals");
        assert_eq!(term_slug("web  accessibility"), "web-accessibility");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = WordPressClient::new("https://example.com/", "admin", "pass").unwrap();
        assert_eq!(client.api("/posts"), "https://example.com/wp-json/wp/v2/posts");
    }
}
