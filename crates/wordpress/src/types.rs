//! Publishing request and result types.

use serde::{Deserialize, Serialize};

/// WordPress post status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Pending,
    Publish,
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

/// What to publish. Content is HTML by the time it reaches a client;
/// markdown conversion happens in the publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub title: String,
    pub slug: String,
    pub content_html: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A post as known to WordPress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpPost {
    pub id: u64,
    pub slug: String,
    pub link: String,
    pub status: String,
}

/// Outcome of a publish call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PublishOutcome {
    /// A new post was created.
    Created { post: WpPost },
    /// An existing post with the same slug was updated (`force_update`).
    Updated { post: WpPost },
    /// The slug already exists and `force_update` was off; the existing
    /// post is returned untouched.
    AlreadyExists { post: WpPost },
}

impl PublishOutcome {
    /// The post this outcome refers to.
    #[must_use]
    pub fn post(&self) -> &WpPost {
        match self {
            Self::Created { post } | Self::Updated { post } | Self::AlreadyExists { post } => post,
        }
    }
}
