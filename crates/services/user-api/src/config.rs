//! User API configuration.

use std::env;

use common::{env_or, env_parse_or, DatabaseConfig, ServerConfig};

/// User API configuration.
#[derive(Debug, Clone, Default)]
pub struct UserApiConfig {
    /// Connection pool settings
    pub database: DatabaseConfig,
    /// HTTP listener settings
    pub server: ServerConfig,
}

impl UserApiConfig {
    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` wins when set; otherwise the URL is assembled from the
    /// `DB_*` parts. Every missing variable falls back to a default and logs
    /// a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let url = match env::var("DATABASE_URL") {
            Ok(url) if !url.is_empty() => url,
            _ => database_url(
                &env_or("DB_USER", "user"),
                &env_or("DB_PASSWORD", "password"),
                &env_or("DB_HOST", "127.0.0.1"),
                env_parse_or("DB_PORT", 5432u16),
                &env_or("DB_NAME", "apidb"),
            ),
        };

        Self {
            database: DatabaseConfig {
                url,
                max_connections: env_parse_or(
                    "DB_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                ),
                min_connections: env_parse_or(
                    "DB_MIN_CONNECTIONS",
                    defaults.database.min_connections,
                ),
                connect_timeout_secs: env_parse_or(
                    "DB_CONNECT_TIMEOUT_SECS",
                    defaults.database.connect_timeout_secs,
                ),
            },
            server: ServerConfig {
                host: env_or("SERVER_HOST", &defaults.server.host),
                port: env_parse_or("SERVER_PORT", defaults.server.port),
            },
        }
    }
}

/// Build a PostgreSQL connection URL from its parts.
pub fn database_url(user: &str, password: &str, host: &str, port: u16, name: &str) -> String {
    format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, name)
}
