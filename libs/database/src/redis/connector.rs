use redis::Client;
use redis::aio::ConnectionManager;
use tracing::info;

use super::RedisConfig;
use crate::common::{Backoff, DatabaseResult, with_retries};

/// Connect to Redis and return a ConnectionManager
///
/// The ConnectionManager automatically handles connection failures and
/// reconnections, so it can be cloned cheaply and shared across tasks.
///
/// # Arguments
/// * `url` - Redis connection string (e.g., "redis://127.0.0.1:6379")
///
/// # Example
/// ```ignore
/// use database::redis::connect;
/// use redis::AsyncCommands;
///
/// let mut conn = connect("redis://127.0.0.1:6379").await?;
/// conn.set::<_, _, ()>("key", "value").await?;
/// ```
pub async fn connect(url: &str) -> DatabaseResult<ConnectionManager> {
    info!("Attempting to connect to Redis at {}", url);

    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    // Verify connection with PING
    let mut conn = manager.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    info!("Successfully connected to Redis");
    Ok(manager)
}

/// Connect using a RedisConfig
///
/// # Example
/// ```ignore
/// use database::redis::{RedisConfig, connect_from_config};
///
/// let config = RedisConfig::new("redis://127.0.0.1:6379");
/// let conn = connect_from_config(&config).await?;
/// ```
pub async fn connect_from_config(config: &RedisConfig) -> DatabaseResult<ConnectionManager> {
    connect(&config.url).await
}

/// Connect to Redis, retrying under the given backoff policy
///
/// For service startup ordering: the cache may still be coming up.
pub async fn connect_with_retry(url: &str, policy: Backoff) -> DatabaseResult<ConnectionManager> {
    with_retries("redis", policy, || connect(url)).await
}

/// Connect from config, retrying under the given backoff policy
pub async fn connect_from_config_with_retry(
    config: &RedisConfig,
    policy: Backoff,
) -> DatabaseResult<ConnectionManager> {
    connect_with_retry(&config.url, policy).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires actual Redis
    async fn test_connect() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let result = connect(&redis_url).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires actual Redis
    async fn test_connect_with_retry() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let result = connect_with_retry(&redis_url, Backoff::default()).await;
        assert!(result.is_ok());
    }
}
