//! WPGraphQL client - alternate publishing path.

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::error::{PublishError, PublishResult};
use crate::types::{PostStatus, PublishRequest, WpPost};

const CREATE_POST_MUTATION: &str = r"
mutation CreatePost($input: CreatePostInput!) {
  createPost(input: $input) {
    post {
      databaseId
      slug
      link
      status
    }
  }
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<CreatePostData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CreatePostData {
    #[serde(rename = "createPost")]
    create_post: Option<CreatePostPayload>,
}

#[derive(Debug, Deserialize)]
struct CreatePostPayload {
    post: Option<GraphQlPost>,
}

#[derive(Debug, Deserialize)]
struct GraphQlPost {
    #[serde(rename = "databaseId")]
    database_id: u64,
    slug: String,
    link: Option<String>,
    status: Option<String>,
}

/// Client for a WPGraphQL endpoint (`/graphql` on the site root).
pub struct WpGraphqlClient {
    endpoint: String,
    auth_header: String,
    client: Client,
}

impl WpGraphqlClient {
    /// Create a client for a site's WPGraphQL endpoint.
    pub fn new(
        base_url: impl Into<String>,
        username: &str,
        app_password: &str,
    ) -> PublishResult<Self> {
        let credentials =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{app_password}"));
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            endpoint: format!("{}/graphql", base_url.into().trim_end_matches('/')),
            auth_header: format!("Basic {credentials}"),
            client,
        })
    }

    /// Create a post via the `createPost` mutation.
    pub async fn create_post(&self, request: &PublishRequest) -> PublishResult<WpPost> {
        let status = match request.status {
            PostStatus::Draft => "DRAFT",
            PostStatus::Pending => "PENDING",
            PostStatus::Publish => "PUBLISH",
        };

        let variables = json!({
            "input": {
                "title": request.title,
                "slug": request.slug,
                "content": request.content_html,
                "excerpt": request.excerpt,
                "status": status,
            }
        });

        tracing::info!(slug = %request.slug, "Creating post via WPGraphQL");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.auth_header)
            .json(&json!({
                "query": CREATE_POST_MUTATION,
                "variables": variables,
            }))
            .send()
            .await?;

        let status_code = response.status();
        if !status_code.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api {
                status: status_code.as_u16(),
                message: body,
            });
        }

        let envelope: GraphQlResponse = response.json().await?;

        if !envelope.errors.is_empty() {
            let messages: Vec<String> =
                envelope.errors.into_iter().map(|e| e.message).collect();
            return Err(PublishError::GraphQl(messages.join("; ")));
        }

        let post = envelope
            .data
            .and_then(|d| d.create_post)
            .and_then(|p| p.post)
            .ok_or_else(|| PublishError::GraphQl("createPost returned no post".to_string()))?;

        Ok(WpPost {
            id: post.database_id,
            slug: post.slug,
            link: post.link.unwrap_or_default(),
            status: post.status.unwrap_or_default().to_lowercase(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> PublishRequest {
        PublishRequest {
            title: "Test".to_string(),
            slug: "test".to_string(),
            content_html: "<p>body</p>".to_string(),
            excerpt: None,
            status: PostStatus::Draft,
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_post_parses_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "createPost": {
                        "post": {
                            "databaseId": 42,
                            "slug": "test",
                            "link": "https://example.com/test",
                            "status": "DRAFT"
                        }
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = WpGraphqlClient::new(server.uri(), "admin", "pass").unwrap();
        let post = client.create_post(&request()).await.unwrap();

        assert_eq!(post.id, 42);
        assert_eq!(post.status, "draft");
    }

    #[tokio::test]
    async fn test_graphql_errors_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": null,
                "errors": [{"message": "Not authorized to create posts"}]
            })))
            .mount(&server)
            .await;

        let client = WpGraphqlClient::new(server.uri(), "admin", "pass").unwrap();
        let err = client.create_post(&request()).await.unwrap_err();
        assert!(err.to_string().contains("Not authorized"));
    }
}
