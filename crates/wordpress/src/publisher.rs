//! Publisher - slug-idempotent publishing over REST or WPGraphQL.

use pulldown_cmark::{html, Options, Parser};

use crate::error::{PublishError, PublishResult};
use crate::graphql::WpGraphqlClient;
use crate::rest::WordPressClient;
use crate::types::{PublishOutcome, PublishRequest};

/// Which API path to publish through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishPath {
    /// WordPress REST API (default).
    #[default]
    Rest,
    /// WPGraphQL mutation path.
    GraphQl,
}

/// Publishes articles to WordPress.
///
/// The slug-existence check makes publishing idempotent: an existing
/// slug short-circuits to `AlreadyExists` unless `force_update` is set,
/// in which case the post is updated in place. The GraphQL path shares
/// the same check through the REST client.
pub struct Publisher {
    rest: WordPressClient,
    graphql: Option<WpGraphqlClient>,
    path: PublishPath,
}

impl Publisher {
    /// Create a REST-only publisher.
    #[must_use]
    pub fn new(rest: WordPressClient) -> Self {
        Self {
            rest,
            graphql: None,
            path: PublishPath::Rest,
        }
    }

    /// Attach a WPGraphQL client and publish through it.
    #[must_use]
    pub fn with_graphql(mut self, graphql: WpGraphqlClient) -> Self {
        self.graphql = Some(graphql);
        self.path = PublishPath::GraphQl;
        self
    }

    /// Publish a request, idempotent on slug.
    pub async fn publish(
        &self,
        request: &PublishRequest,
        force_update: bool,
    ) -> PublishResult<PublishOutcome> {
        if let Some(existing) = self.rest.find_post_by_slug(&request.slug).await? {
            if !force_update {
                tracing::info!(slug = %request.slug, post_id = existing.id, "Slug exists, skipping publish");
                return Ok(PublishOutcome::AlreadyExists { post: existing });
            }

            let (categories, tags) = self.resolve_terms(request).await?;
            let post = self
                .rest
                .update_post(existing.id, request, categories, tags)
                .await?;
            return Ok(PublishOutcome::Updated { post });
        }

        match self.path {
            PublishPath::Rest => {
                let (categories, tags) = self.resolve_terms(request).await?;
                let post = self.rest.create_post(request, categories, tags).await?;
                Ok(PublishOutcome::Created { post })
            }
            PublishPath::GraphQl => {
                let graphql = self.graphql.as_ref().ok_or_else(|| {
                    PublishError::NotConfigured("GraphQL path selected without a client".into())
                })?;
                let post = graphql.create_post(request).await?;
                Ok(PublishOutcome::Created { post })
            }
        }
    }

    /// Resolve category and tag names to term IDs.
    async fn resolve_terms(&self, request: &PublishRequest) -> PublishResult<(Vec<u64>, Vec<u64>)> {
        let mut categories = Vec::with_capacity(request.categories.len());
        for name in &request.categories {
            categories.push(self.rest.ensure_category(name).await?);
        }

        let mut tags = Vec::with_capacity(request.tags.len());
        for name in &request.tags {
            tags.push(self.rest.ensure_tag(name).await?);
        }

        Ok((categories, tags))
    }
}

/// Render article markdown to the HTML WordPress stores.
#[must_use]
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_html() {
        let html = markdown_to_html("# Title\n\nA *paragraph* with [a link](https://example.com).");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<em>paragraph</em>"));
        assert!(html.contains("href=\"https://example.com\""));
    }

    #[test]
    fn test_markdown_tables_enabled() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }
}
