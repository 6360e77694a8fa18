//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Database
//! - `DATABASE_URL` - Full `PostgreSQL` connection string. When set, the
//!   `DB_*` variables below are ignored.
//! - `DB_HOST` - Database host (default: localhost)
//! - `DB_PORT` - Database port (default: 5432)
//! - `DB_USER` - Database user (default: postgres)
//! - `DB_PASSWORD` - Database password (default: empty)
//! - `DB_NAME` - Database name (default: quickcart)
//!
//! ## Server
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//!
//! ## Cache
//! - `CACHE_TTL` - Product cache time-to-live in seconds (default: 60)
//! - `CACHE_MAX_ENTRIES` - Product cache capacity (default: 10000)
//!
//! ## Optional
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

const DEFAULT_CACHE_TTL_SECS: &str = "60";
const DEFAULT_CACHE_MAX_ENTRIES: &str = "10000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Relational store connection settings
    pub database: DatabaseConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Product read cache settings
    pub cache: CacheConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// `PostgreSQL` connection settings.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full connection URL, overrides the individual parts
    pub url: Option<SecretString>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: SecretString,
    pub name: String,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

impl DatabaseConfig {
    /// Build `sqlx` connect options from the URL or the individual parts.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` if `DATABASE_URL` cannot be parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url.expose_secret());
        }

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.name);
        let password = self.password.expose_secret();
        if !password.is_empty() {
            options = options.password(password);
        }
        Ok(options)
    }
}

/// Product read cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long an entry stays fresh after insertion
    pub ttl: Duration,
    /// Maximum number of cached entries
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_entries: 10_000,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database = DatabaseConfig {
            url: env.optional("DATABASE_URL").map(SecretString::from),
            host: env.or_default("DB_HOST", "localhost"),
            port: env.parsed("DB_PORT", "5432")?,
            user: env.or_default("DB_USER", "postgres"),
            password: SecretString::from(env.or_default("DB_PASSWORD", "")),
            name: env.or_default("DB_NAME", "quickcart"),
        };

        let host = env.parsed("HOST", "127.0.0.1")?;
        let port = env.parsed("PORT", "3000")?;

        let ttl_secs: u64 = env.parsed("CACHE_TTL", DEFAULT_CACHE_TTL_SECS)?;
        if ttl_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CACHE_TTL".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let cache = CacheConfig {
            ttl: Duration::from_secs(ttl_secs),
            max_entries: env.parsed("CACHE_MAX_ENTRIES", DEFAULT_CACHE_MAX_ENTRIES)?,
        };

        Ok(Self {
            database,
            host,
            port,
            cache,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable, treating blank values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a variable (or its default) parsed into `T`.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host.to_string(), "127.0.0.1");
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert_eq!(config.database.name, "quickcart");
        assert!(config.database.url.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("HOST", "0.0.0.0"),
            ("CACHE_TTL", "5"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "6543"),
            ("DB_NAME", "shop"),
        ])
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.cache.ttl, Duration::from_secs(5));
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.name, "shop");
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[("PORT", "not-a-port")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PORT"));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let err = load(&[("CACHE_TTL", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "CACHE_TTL"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = load(&[("PORT", "  "), ("DATABASE_URL", "")]).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_connect_options_from_parts() {
        let config = load(&[("DB_HOST", "db"), ("DB_USER", "shop"), ("DB_PASSWORD", "pw")]).unwrap();
        let options = config.database.connect_options().unwrap();
        assert_eq!(options.get_host(), "db");
        assert_eq!(options.get_username(), "shop");
        assert_eq!(options.get_database(), Some("quickcart"));
    }

    #[test]
    fn test_connect_options_from_url() {
        let config = load(&[("DATABASE_URL", "postgres://app:pw@pg.example:5433/store")]).unwrap();
        let options = config.database.connect_options().unwrap();
        assert_eq!(options.get_host(), "pg.example");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("store"));
    }

    #[test]
    fn test_database_config_debug_redacts_secrets() {
        let config = load(&[
            ("DB_PASSWORD", "super_secret_password"),
            ("DATABASE_URL", "postgres://u:super_secret_url@h/db"),
        ])
        .unwrap();

        let debug_output = format!("{:?}", config.database);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password"));
        assert!(!debug_output.contains("super_secret_url"));
    }
}
