// Cache module with in-memory fallback when Redis is not available

use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CacheConfig;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Cache operation failed: {0}")]
    OperationFailed(String),
}

#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
    async fn clear(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        if let Some(expires_at) = self.expires_at {
            Instant::now() > expires_at
        } else {
            false
        }
    }
}

/// In-memory cache implementation, used as fallback and in tests.
#[derive(Debug, Clone)]
pub struct InMemoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    capacity: usize,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Drops all expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut store = self.store.write().unwrap();
        let before = store.len();
        store.retain(|_, entry| !entry.is_expired());
        before - store.len()
    }

    /// Spawns a background task that purges expired entries on an interval.
    pub fn spawn_cleanup(&self, every: Duration) {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(removed, "Purged expired cache entries");
                }
            }
        });
    }
}

#[async_trait::async_trait]
impl CacheBackend for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let store = self.store.read().unwrap();
        if let Some(entry) = store.get(key) {
            if entry.is_expired() {
                drop(store);
                let mut store = self.store.write().unwrap();
                store.remove(key);
                Ok(None)
            } else {
                Ok(Some(entry.value.clone()))
            }
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut store = self.store.write().unwrap();
        if store.len() >= self.capacity && !store.contains_key(key) {
            store.retain(|_, entry| !entry.is_expired());
            // Still full: evict entries closest to expiry so the map stays
            // bounded. Entries without a TTL go last.
            while store.len() >= self.capacity {
                let victim = store
                    .iter()
                    .min_by(|a, b| match (a.1.expires_at, b.1.expires_at) {
                        (Some(x), Some(y)) => x.cmp(&y),
                        (Some(_), None) => std::cmp::Ordering::Less,
                        (None, Some(_)) => std::cmp::Ordering::Greater,
                        (None, None) => std::cmp::Ordering::Equal,
                    })
                    .map(|(k, _)| k.clone());
                match victim {
                    Some(k) => {
                        store.remove(&k);
                    }
                    None => break,
                }
            }
        }
        store.insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut store = self.store.write().unwrap();
        store.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let store = self.store.read().unwrap();
        if let Some(entry) = store.get(key) {
            Ok(!entry.is_expired())
        } else {
            Ok(false)
        }
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut store = self.store.write().unwrap();
        store.clear();
        Ok(())
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Redis-backed cache implementation.
#[derive(Clone)]
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    pub fn new(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<redis::aio::Connection, CacheError> {
        Ok(self.client.get_async_connection().await?)
    }
}

#[async_trait::async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl.as_secs() as usize).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.connection().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Cache factory
pub struct CacheFactory;

impl CacheFactory {
    /// Builds the cache backend selected by configuration.
    ///
    /// An unreachable Redis degrades to the in-memory cache with a warning
    /// rather than failing startup.
    pub async fn create_cache(config: &CacheConfig) -> Arc<dyn CacheBackend> {
        if config.cache_type.eq_ignore_ascii_case("redis") {
            match RedisCache::new(&config.redis_url) {
                Ok(redis_cache) => match redis_cache.connection().await {
                    Ok(_) => {
                        debug!("Using Redis cache at {}", config.redis_url);
                        return Arc::new(redis_cache);
                    }
                    Err(e) => {
                        warn!(
                            "Redis at {} unreachable ({}), falling back to in-memory cache",
                            config.redis_url, e
                        );
                    }
                },
                Err(e) => {
                    warn!(
                        "Invalid Redis URL {} ({}), falling back to in-memory cache",
                        config.redis_url, e
                    );
                }
            }
        }

        let cache = InMemoryCache::with_capacity(config.capacity);
        cache.spawn_cleanup(Duration::from_secs(config.cleanup_interval_secs.max(1)));
        Arc::new(cache)
    }
}
