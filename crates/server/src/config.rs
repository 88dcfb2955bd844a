//! Configuration for the dashboard server.

use std::env;
use std::path::PathBuf;

/// WordPress connection settings.
#[derive(Debug, Clone)]
pub struct WordPressConfig {
    /// Site root URL.
    pub base_url: String,
    /// Username the application password belongs to.
    pub username: String,
    /// Application password.
    pub app_password: String,
    /// Publish through WPGraphQL instead of REST.
    pub use_graphql: bool,
}

/// Server configuration, read from the environment. Optional pieces
/// disable their feature rather than failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Postgres URL; absent disables persistence and vector search.
    pub database_url: Option<String>,
    /// Redis URL; absent disables the cache.
    pub redis_url: Option<String>,
    /// WordPress credentials; absent disables publishing.
    pub wordpress: Option<WordPressConfig>,
    /// Model for all generation calls.
    pub model: String,
    /// Content niche.
    pub niche: String,
    /// Directory for run artifacts.
    pub output_dir: PathBuf,
    /// JSON file listing competitor sites.
    pub sites_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let wordpress = match (
            env::var("WORDPRESS_URL").ok().filter(|s| !s.is_empty()),
            env::var("WORDPRESS_USERNAME").ok(),
            env::var("WORDPRESS_APP_PASSWORD").ok(),
        ) {
            (Some(base_url), Some(username), Some(app_password)) => Some(WordPressConfig {
                base_url,
                username,
                app_password,
                use_graphql: env::var("WORDPRESS_USE_GRAPHQL")
                    .map(|v| v == "true" || v == "1")
                    .unwrap_or(false),
            }),
            _ => None,
        };

        Self {
            port: env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            wordpress,
            model: env::var("PIPELINE_MODEL")
                .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            niche: env::var("PIPELINE_NICHE").unwrap_or_else(|_| "ADA compliance".to_string()),
            output_dir: env::var("PIPELINE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            sites_file: env::var("COMPETITOR_SITES_FILE").ok().map(PathBuf::from),
        }
    }
}

impl Config {
    /// Read configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "SERVER_PORT",
            "DATABASE_URL",
            "REDIS_URL",
            "WORDPRESS_URL",
            "WORDPRESS_USERNAME",
            "WORDPRESS_APP_PASSWORD",
            "WORDPRESS_USE_GRAPHQL",
            "PIPELINE_MODEL",
            "PIPELINE_NICHE",
            "PIPELINE_OUTPUT_DIR",
            "COMPETITOR_SITES_FILE",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = Config::from_env();

        assert_eq!(config.port, 8080);
        assert!(config.database_url.is_none());
        assert!(config.wordpress.is_none());
        assert_eq!(config.niche, "ADA compliance");
    }

    #[test]
    #[serial]
    fn test_wordpress_requires_all_three_vars() {
        clear_env();
        std::env::set_var("WORDPRESS_URL", "https://example.com");
        std::env::set_var("WORDPRESS_USERNAME", "admin");
        let config = Config::from_env();
        assert!(config.wordpress.is_none());

        std::env::set_var("WORDPRESS_APP_PASSWORD", "secret");
        let config = Config::from_env();
        let wp = config.wordpress.unwrap();
        assert_eq!(wp.base_url, "https://example.com");
        assert!(!wp.use_graphql);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_port_override() {
        clear_env();
        std::env::set_var("SERVER_PORT", "9100");
        let config = Config::from_env();
        assert_eq!(config.port, 9100);
        clear_env();
    }
}
