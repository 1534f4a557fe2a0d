//! Application configuration loaded from environment variables.

use std::env;

use quill_core::domain::Pagination;
use quill_infra::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    /// Page size of the public post list.
    pub posts_per_page: u64,
    /// Bearer token guarding `/api/admin`. Admin routes are closed when unset.
    pub admin_token: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(100),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(10),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            posts_per_page: parse_var("POSTS_PER_PAGE")
                .filter(|n| *n > 0)
                .unwrap_or(Pagination::DEFAULT_PER_PAGE),
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
