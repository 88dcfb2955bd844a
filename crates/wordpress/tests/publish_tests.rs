//! Integration tests for slug-idempotent publishing against a mock
//! WordPress REST API.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wordpress::{PostStatus, PublishOutcome, PublishRequest, Publisher, WordPressClient};

fn request(slug: &str) -> PublishRequest {
    PublishRequest {
        title: "Service Animals Under the ADA".to_string(),
        slug: slug.to_string(),
        content_html: "<h1>Service Animals Under the ADA</h1><p>Body.</p>".to_string(),
        excerpt: Some("What businesses need to know.".to_string()),
        status: PostStatus::Draft,
        categories: Vec::new(),
        tags: Vec::new(),
    }
}

fn post_json(id: u64, slug: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "slug": slug,
        "link": format!("https://example.com/{slug}"),
        "status": "draft"
    })
}

#[tokio::test]
async fn existing_slug_returns_existing_post_without_creating() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("slug", "service-animals-ada"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([post_json(7, "service-animals-ada")])),
        )
        .mount(&server)
        .await;

    // No POST mock is registered: a create attempt would fail the test
    // with an unmatched-request error.
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let client = WordPressClient::new(server.uri(), "admin", "app-pass").unwrap();
    let publisher = Publisher::new(client);

    let outcome = publisher
        .publish(&request("service-animals-ada"), false)
        .await
        .unwrap();

    match outcome {
        PublishOutcome::AlreadyExists { post } => {
            assert_eq!(post.id, 7);
            assert_eq!(post.slug, "service-animals-ada");
        }
        other => panic!("expected AlreadyExists, got {other:?}"),
    }
}

#[tokio::test]
async fn new_slug_creates_post() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("slug", "ada-tax-credit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(post_json(11, "ada-tax-credit")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = WordPressClient::new(server.uri(), "admin", "app-pass").unwrap();
    let publisher = Publisher::new(client);

    let outcome = publisher.publish(&request("ada-tax-credit"), false).await.unwrap();

    match outcome {
        PublishOutcome::Created { post } => assert_eq!(post.id, 11),
        other => panic!("expected Created, got {other:?}"),
    }
}

#[tokio::test]
async fn force_update_updates_existing_post() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .and(query_param("slug", "ada-basics"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([post_json(3, "ada-basics")])),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(post_json(3, "ada-basics")))
        .expect(1)
        .mount(&server)
        .await;

    let client = WordPressClient::new(server.uri(), "admin", "app-pass").unwrap();
    let publisher = Publisher::new(client);

    let outcome = publisher.publish(&request("ada-basics"), true).await.unwrap();

    match outcome {
        PublishOutcome::Updated { post } => assert_eq!(post.id, 3),
        other => panic!("expected Updated, got {other:?}"),
    }
}

#[tokio::test]
async fn categories_and_tags_resolved_before_create() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    // Category exists already
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/categories"))
        .and(query_param("slug", "ada-compliance"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": 21}])))
        .mount(&server)
        .await;

    // Tag is missing and gets created
    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/tags"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 33})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wp/v2/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(post_json(50, "tagged-post")))
        .mount(&server)
        .await;

    let client = WordPressClient::new(server.uri(), "admin", "app-pass").unwrap();
    let publisher = Publisher::new(client);

    let mut req = request("tagged-post");
    req.categories = vec!["ADA Compliance".to_string()];
    req.tags = vec!["service animals".to_string()];

    let outcome = publisher.publish(&req, false).await.unwrap();
    assert_eq!(outcome.post().id, 50);
}
