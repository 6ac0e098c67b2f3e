//! Key/value caches with a time-to-live
//!
//! The engine never touches a cache directly; weather lookups go through
//! [`TtlCache`] so the on-disk store can be swapped for [`MemoryCache`] in
//! tests or when caching is disabled.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tokio::task;

#[async_trait]
pub trait TtlCache: Send + Sync {
    /// Bytes stored under `key`, `None` when missing or expired
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn put_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// Fetch and decode a value stored with [`put`]
pub async fn get<T: DeserializeOwned>(cache: &dyn TtlCache, key: &str) -> Result<Option<T>> {
    match cache.get_raw(key).await? {
        Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and store a value for `ttl`
pub async fn put<T: Serialize>(cache: &dyn TtlCache, key: &str, value: &T, ttl: Duration) -> Result<()> {
    let bytes = postcard::to_stdvec(value)?;
    cache.put_raw(key, bytes, ttl).await
}

#[derive(Serialize, Deserialize)]
struct StoredEntry {
    value: Vec<u8>,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Cache persisted with fjall, survives restarts
pub struct PersistentCache {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

impl PersistentCache {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("cache", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentCache { store: items })
    }
}

#[async_trait]
impl TtlCache for PersistentCache {
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry = postcard::from_bytes(&bytes)?;
        if unix_now()? < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    async fn put_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let bytes = postcard::to_stdvec(&StoredEntry { value, expires_at })?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

/// Process-local cache, lost on restart
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl TtlCache for MemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some((value, expires_at)) if Instant::now() < *expires_at => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => {}
            }
        }

        // A put may have landed between the two locks
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((value, expires_at)) if Instant::now() < *expires_at => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        values: Vec<f64>,
    }

    fn sample() -> Sample {
        Sample {
            name: "monte-cavo".into(),
            values: vec![0.0, 1.5, 12.25],
        }
    }

    #[tokio::test]
    async fn test_memory_cache_typed_helpers() {
        let cache = MemoryCache::new();
        put(&cache, "wx:test", &sample(), Duration::from_secs(60))
            .await
            .unwrap();
        let loaded: Option<Sample> = get(&cache, "wx:test").await.unwrap();
        assert_eq!(loaded, Some(sample()));

        let missing: Option<Sample> = get(&cache, "wx:other").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_memory_cache_expiry_removes_entry() {
        let cache = MemoryCache::new();
        cache
            .put_raw("short", vec![1, 2, 3], Duration::from_millis(5))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get_raw("short").await.unwrap().is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_memory_cache_keeps_entry_refreshed_after_expiry() {
        let cache = std::sync::Arc::new(MemoryCache::new());
        cache
            .put_raw("wx:key", vec![1], Duration::from_millis(5))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Readers racing a writer must never delete the fresh value
        let writer = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .put_raw("wx:key", vec![2], Duration::from_secs(60))
                    .await
            })
        };
        let readers: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_raw("wx:key").await })
            })
            .collect();

        writer.await.unwrap().unwrap();
        for reader in readers {
            let value = reader.await.unwrap().unwrap();
            assert!(value.is_none() || value == Some(vec![2]));
        }
        assert_eq!(cache.get_raw("wx:key").await.unwrap(), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_persistent_cache_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        put(&cache, "wx:test", &sample(), Duration::from_secs(3600))
            .await
            .unwrap();
        let loaded: Option<Sample> = get(&cache, "wx:test").await.unwrap();
        assert_eq!(loaded, Some(sample()));

        cache.remove("wx:test").await.unwrap();
        let gone: Option<Sample> = get(&cache, "wx:test").await.unwrap();
        assert!(gone.is_none());
    }

    #[tokio::test]
    async fn test_persistent_cache_zero_ttl_is_expired() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();
        cache
            .put_raw("stale", vec![9], Duration::ZERO)
            .await
            .unwrap();
        assert!(cache.get_raw("stale").await.unwrap().is_none());
    }
}
