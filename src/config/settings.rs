//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::shared::pagination::PageLimits;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port, API prefix)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration
    pub redis: RedisSettings,

    /// Session cookie and token settings
    pub session: SessionSettings,

    /// Rate limiting configuration
    pub rate_limit: RateLimitSettings,

    /// Uploaded media storage
    pub storage: StorageSettings,

    /// List endpoint page sizes
    pub pagination: PaginationSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply embedded migrations on startup
    pub run_migrations: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis connection URL. Empty when the memory rate-limit backend is used.
    pub url: String,
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Name of the session cookie
    pub cookie_name: String,

    /// Session lifetime in hours
    pub ttl_hours: i64,

    /// Set the `Secure` cookie attribute
    pub secure_cookie: bool,

    /// Verification token lifetime in hours
    pub verification_ttl_hours: i64,
}

/// Counter store used by the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitBackend {
    Redis,
    Memory,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// Where counters live
    pub backend: RateLimitBackend,

    /// Let requests through when the counter store is unreachable
    pub fail_open: bool,
}

/// Object storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory uploaded objects are written under
    pub root_dir: String,

    /// Base URL objects are served from; the key is appended
    pub public_base_url: String,
}

/// Page size bounds for list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationSettings {
    pub default_limit: i64,
    pub max_limit: i64,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine/worker ID (0-1023)
    pub machine_id: u16,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. Built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. `APP__SECTION__KEY` environment variables
    /// 5. Well-known plain variables (`DATABASE_URL`, `REDIS_URL`, ...)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed, or
    /// if the loaded values are inconsistent.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let settings: Self = Self::builder(&environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=3000 -> server.port = 3000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "snowflake.machine_id",
                std::env::var("SNOWFLAKE_MACHINE_ID").ok(),
            )?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Defaults shared by `load` and tests.
    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("redis.url", "")?
            .set_default("session.cookie_name", "session")?
            .set_default("session.ttl_hours", 24 * 30)?
            .set_default("session.secure_cookie", false)?
            .set_default("session.verification_ttl_hours", 24)?
            .set_default("rate_limit.backend", "redis")?
            .set_default("rate_limit.fail_open", true)?
            .set_default("storage.root_dir", "./uploads")?
            .set_default("storage.public_base_url", "http://localhost:3000/media")?
            .set_default("pagination.default_limit", 20)?
            .set_default("pagination.max_limit", 50)?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.epoch", crate::shared::snowflake::DEFAULT_EPOCH_MS)?
            .set_default("cors.allowed_origins", vec!["http://localhost:3000"])
    }

    /// Reject configurations that would misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.is_empty() {
            return Err(ConfigError::Message("database.url (DATABASE_URL) is required".into()));
        }
        if self.rate_limit.backend == RateLimitBackend::Redis && self.redis.url.is_empty() {
            return Err(ConfigError::Message(
                "redis.url (REDIS_URL) is required when rate_limit.backend = \"redis\"".into(),
            ));
        }
        if self.session.ttl_hours <= 0 {
            return Err(ConfigError::Message("session.ttl_hours must be positive".into()));
        }
        if self.pagination.max_limit < 1 {
            return Err(ConfigError::Message("pagination.max_limit must be at least 1".into()));
        }
        if self.pagination.default_limit < 1 || self.pagination.default_limit > self.pagination.max_limit {
            return Err(ConfigError::Message(format!(
                "pagination.default_limit must be between 1 and {}",
                self.pagination.max_limit
            )));
        }
        if self.snowflake.machine_id > 1023 {
            return Err(ConfigError::Message("snowflake.machine_id must be 0-1023".into()));
        }
        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

impl ServerSettings {
    /// Get the socket address for binding.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Message(format!("Invalid server address: {}", e)))
    }
}

impl PaginationSettings {
    pub fn limits(&self) -> PageLimits {
        PageLimits {
            default: self.default_limit,
            max: self.max_limit,
        }
    }
}

#[cfg(test)]
impl Settings {
    /// Defaults with a memory rate-limit backend, for unit tests.
    pub fn for_tests() -> Self {
        Self::builder("test")
            .and_then(|b| b.set_override("database.url", "postgres://localhost/test"))
            .and_then(|b| b.set_override("rate_limit.backend", "memory"))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("test settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize_and_validate() {
        let settings = Settings::for_tests();
        assert!(settings.validate().is_ok());
        assert!(settings.rate_limit.fail_open);
        assert_eq!(settings.pagination.limits(), PageLimits::default());
    }

    #[test]
    fn default_limit_above_max_is_rejected() {
        let mut settings = Settings::for_tests();
        settings.pagination.default_limit = 80;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn redis_backend_needs_url() {
        let mut settings = Settings::for_tests();
        settings.rate_limit.backend = RateLimitBackend::Redis;
        assert!(settings.validate().is_err());
    }
}
