#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]

//! # WordPress
//!
//! Publishing clients for the content pipeline.
//!
//! Provides a REST client (`/wp-json/wp/v2`), a WPGraphQL client as the
//! alternate path, and a `Publisher` that makes publishing idempotent on
//! the post slug.

pub mod error;
pub mod graphql;
pub mod publisher;
pub mod rest;
pub mod types;

pub use error::{PublishError, PublishResult};
pub use graphql::WpGraphqlClient;
pub use publisher::{markdown_to_html, PublishPath, Publisher};
pub use rest::{WordPressClient, WpMedia};
pub use types::{PostStatus, PublishOutcome, PublishRequest, WpPost};
