//! Redis-backed caching for chat configs and chat responses
//!
//! Everything in here is derived data. Callers treat cache failures as a
//! miss: log, fall back to the store of record, keep going.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::instrument;

use crate::error::KnowledgeResult;

/// TTL for cached chat responses (1 hour)
pub const CHAT_RESPONSE_TTL_SECS: u64 = 3600;

/// Key for a tenant's cached chat config (pair list)
pub fn chat_config_key(tenant_id: &str) -> String {
    format!("chat_configs:{}", tenant_id)
}

/// Key for a tenant's knowledge version counter
pub fn version_key(tenant_id: &str) -> String {
    format!("kb_version:{}", tenant_id)
}

/// Key for a cached chat response
///
/// Embeds the caller identity, the knowledge version current at write
/// time, and the message digest. A version bump strands every older
/// response entry; the TTL reclaims them.
pub fn chat_response_key(api_key: &str, version: u64, digest: &str) -> String {
    format!("chat:{}:v{}:{}", api_key, version, digest)
}

/// Cache operations used by the knowledge domain
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Get a cached value
    async fn get(&self, key: &str) -> KnowledgeResult<Option<String>>;

    /// Set a value, optionally with a TTL in seconds
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> KnowledgeResult<()>;

    /// Delete a key; deleting an absent key succeeds
    async fn delete(&self, key: &str) -> KnowledgeResult<()>;

    /// Drop every key in the cache database
    async fn flush_all(&self) -> KnowledgeResult<()>;

    /// Current knowledge version for a tenant (0 if never bumped)
    async fn knowledge_version(&self, tenant_id: &str) -> KnowledgeResult<u64>;

    /// Increment a tenant's knowledge version, returning the new value
    async fn bump_knowledge_version(&self, tenant_id: &str) -> KnowledgeResult<u64>;
}

/// Redis implementation of ResponseCache
#[derive(Clone)]
pub struct RedisResponseCache {
    redis: ConnectionManager,
}

impl RedisResponseCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl ResponseCache for RedisResponseCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> KnowledgeResult<Option<String>> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> KnowledgeResult<()> {
        let mut conn = self.redis.clone();
        match ttl_secs {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> KnowledgeResult<()> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn flush_all(&self) -> KnowledgeResult<()> {
        let mut conn = self.redis.clone();
        redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn knowledge_version(&self, tenant_id: &str) -> KnowledgeResult<u64> {
        let mut conn = self.redis.clone();
        let version: Option<u64> = conn.get(version_key(tenant_id)).await?;
        Ok(version.unwrap_or(0))
    }

    #[instrument(skip(self))]
    async fn bump_knowledge_version(&self, tenant_id: &str) -> KnowledgeResult<u64> {
        let mut conn = self.redis.clone();
        let version: u64 = conn.incr(version_key(tenant_id), 1).await?;
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_builders() {
        assert_eq!(chat_config_key("store-1"), "chat_configs:store-1");
        assert_eq!(version_key("store-1"), "kb_version:store-1");
        assert_eq!(
            chat_response_key("key-abc", 3, "deadbeef"),
            "chat:key-abc:v3:deadbeef"
        );
    }

    #[test]
    fn test_version_bump_changes_response_key() {
        let before = chat_response_key("key-abc", 1, "deadbeef");
        let after = chat_response_key("key-abc", 2, "deadbeef");
        assert_ne!(before, after);
    }

    #[tokio::test]
    #[ignore] // Requires actual Redis
    async fn test_version_counter_live() {
        let conn = database::redis::connect("redis://127.0.0.1:6379")
            .await
            .unwrap();
        let cache = RedisResponseCache::new(conn);

        let before = cache.knowledge_version("test-tenant").await.unwrap();
        let after = cache.bump_knowledge_version("test-tenant").await.unwrap();
        assert_eq!(after, before + 1);
    }
}
