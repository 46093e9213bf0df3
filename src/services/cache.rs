use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 is an in-process moka cache, L2 is Redis shared across instances.
/// Without a Redis URL the manager runs on L1 alone.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// Create an L1-only cache manager
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    pub fn has_redis(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(l2) = &self.redis {
            let mut conn = l2.lock().await;
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);

                // Populate L1 cache
                self.l1_cache
                    .insert(key.to_string(), json.as_bytes().to_vec())
                    .await;

                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both tiers when Redis is configured)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(l2) = &self.redis {
            let mut conn = l2.lock().await;
            let _: () = redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from both cache tiers
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;

        if let Some(l2) = &self.redis {
            let mut conn = l2.lock().await;
            let _: () = redis::cmd("DEL")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
        }
        Ok(())
    }
}

fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
    moka::future::CacheBuilder::new(l1_size)
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Public "latest pets" listing
    pub fn latest_pets() -> String {
        "pets:latest".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_set_get_delete() {
        let cache = CacheManager::in_memory(100, 60);
        assert!(!cache.has_redis());

        let key = CacheKey::latest_pets();
        cache.set(&key, &vec![1, 2, 3]).await.unwrap();
        let result: Vec<i32> = cache.get(&key).await.unwrap();
        assert_eq!(result, vec![1, 2, 3]);

        cache.delete(&key).await.unwrap();
        assert!(matches!(
            cache.get::<Vec<i32>>(&key).await,
            Err(CacheError::CacheMiss(_))
        ));
    }

    #[tokio::test]
    #[ignore = "Requires Redis"]
    async fn test_redis_set_get() {
        let cache = CacheManager::new("redis://127.0.0.1:6379", 1000, 60)
            .await
            .expect("Failed to create cache");

        let key = "tinpet_test_key";
        cache.set(key, &"test_value").await.unwrap();
        let result: String = cache.get(key).await.unwrap();
        assert_eq!(result, "test_value");

        cache.delete(key).await.unwrap();
        assert!(cache.get::<String>(key).await.is_err());
    }

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::latest_pets(), "pets:latest");
    }
}
