#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::uninlined_format_args)]

//! # Monitor
//!
//! Competitor blog monitoring for the content pipeline.
//!
//! Scrapes competitor blog indexes through a markdown scraping service,
//! fetches recent articles, and aggregates keyword frequency across
//! titles and headings. Scan results are cached to a JSON file.

pub mod cache;
pub mod competitors;
pub mod scraper;

pub use cache::ScanCache;
pub use competitors::{
    CompetitorArticle, CompetitorMonitor, CompetitorSite, MonitorConfig, ScanReport,
};
pub use scraper::{extract_links, ScrapeClient, ScrapeOptions, ScrapedPage};
