#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]

//! # Server
//!
//! HTTP dashboard for the content pipeline: pipeline runs, competitor
//! scans, one-off article generation, vector search, usage totals, and
//! configuration-profile CRUD.

pub mod config;
pub mod profiles;
pub mod routes;
pub mod state;

pub use config::{Config, WordPressConfig};
pub use routes::build_router;
pub use state::AppState;
