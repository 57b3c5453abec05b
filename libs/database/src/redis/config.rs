#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv};

/// Redis cache configuration
///
/// Holds Redis connection settings. Can be constructed manually or loaded
/// from environment variables (with the `config` feature).
///
/// # Example
///
/// ```ignore
/// use database::redis::RedisConfig;
///
/// // Manual construction
/// let config = RedisConfig::new("redis://127.0.0.1:6379");
///
/// // From environment variables (requires `config` feature)
/// let config = RedisConfig::from_env()?;
///
/// // Use with connect()
/// let conn = database::redis::connect(&config.url).await?;
/// ```
#[derive(Clone, Debug)]
pub struct RedisConfig {
    /// Redis connection URL (required)
    pub url: String,

    /// Optional database number (0-15 for default Redis)
    pub database: Option<u8>,

    /// Optional username for Redis ACL
    pub username: Option<String>,

    /// Optional password for authentication
    pub password: Option<String>,
}

impl RedisConfig {
    /// Create a new RedisConfig with just a URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: None,
            username: None,
            password: None,
        }
    }

    /// Create a RedisConfig with authentication
    pub fn with_auth(
        url: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        Self {
            username,
            password,
            ..Self::new(url)
        }
    }

    /// Create a RedisConfig with a specific database number
    pub fn with_database(url: impl Into<String>, database: u8) -> Self {
        Self {
            database: Some(database),
            ..Self::new(url)
        }
    }

    /// Get a reference to the Redis URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::new("redis://127.0.0.1:6379")
    }
}

/// Load RedisConfig from environment variables
///
/// Environment variables:
/// - `REDIS_URL` (required) - Redis connection string
/// - `REDIS_DATABASE` (optional) - Redis database number (0-15)
/// - `REDIS_USERNAME` (optional) - Username for Redis ACL
/// - `REDIS_PASSWORD` (optional) - Password for authentication
#[cfg(feature = "config")]
impl FromEnv for RedisConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = core_config::env_required("REDIS_URL")?;

        let database = if let Ok(db_str) = std::env::var("REDIS_DATABASE") {
            Some(db_str.parse().map_err(|e| ConfigError::ParseError {
                key: "REDIS_DATABASE".to_string(),
                details: format!("{}", e),
            })?)
        } else {
            None
        };

        let username = std::env::var("REDIS_USERNAME").ok();
        let password = std::env::var("REDIS_PASSWORD").ok();

        Ok(Self {
            url,
            database,
            username,
            password,
        })
    }
}
