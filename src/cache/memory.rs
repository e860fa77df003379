use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::CacheInvalidator;
use crate::error::RemoteError;
use crate::search_config::EffectiveConfig;

struct CachedEntry {
    config: EffectiveConfig,
    cached_at: Instant,
}

/// In-process cache of resolved configs / 进程内已解析配置缓存
///
/// Entries expire after `ttl` and are dropped on invalidation. Every removal
/// bumps `epoch` under the write lock, so a reader that loaded before the
/// removal can detect it and skip caching what it read.
pub struct ConfigCache {
    entries: RwLock<HashMap<i64, CachedEntry>>,
    epoch: AtomicU64,
    ttl: Duration,
}

impl ConfigCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            epoch: AtomicU64::new(0),
            ttl,
        }
    }

    /// Fresh entry or None / 获取未过期的缓存
    pub fn get(&self, store_id: i64) -> Option<EffectiveConfig> {
        let entries = self.entries.read();
        entries
            .get(&store_id)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .map(|entry| entry.config.clone())
    }

    /// Current invalidation epoch, read before loading from the store / 当前失效版本号
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn insert(&self, store_id: i64, config: EffectiveConfig) {
        let mut entries = self.entries.write();
        self.put(&mut entries, store_id, config);
    }

    /// Insert only if nothing was invalidated since `epoch` / 期间无失效时才写入缓存
    pub fn insert_if_fresh(&self, store_id: i64, epoch: u64, config: EffectiveConfig) -> bool {
        let mut entries = self.entries.write();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        self.put(&mut entries, store_id, config);
        true
    }

    fn put(&self, entries: &mut HashMap<i64, CachedEntry>, store_id: i64, config: EffectiveConfig) {
        // Drop expired entries while holding the lock / 顺便清理过期缓存
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.cached_at.elapsed() < ttl);
        entries.insert(
            store_id,
            CachedEntry {
                config,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn remove(&self, store_id: i64) -> bool {
        let mut entries = self.entries.write();
        self.epoch.fetch_add(1, Ordering::SeqCst);
        entries.remove(&store_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheInvalidator for ConfigCache {
    async fn invalidate(&self, store_id: i64) -> Result<(), RemoteError> {
        if self.remove(store_id) {
            tracing::debug!("Local config cache entry dropped for store {}", store_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(per_page: i64) -> EffectiveConfig {
        EffectiveConfig {
            per_page: Some(per_page),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let cache = ConfigCache::new(Duration::from_secs(60));
        assert!(cache.is_empty());

        cache.insert(1, cfg(10));
        assert_eq!(cache.get(1), Some(cfg(10)));
        assert_eq!(cache.get(2), None);

        assert!(cache.remove(1));
        assert!(!cache.remove(1));
        assert_eq!(cache.get(1), None);
    }

    #[test]
    fn test_expired_entries_are_ignored() {
        let cache = ConfigCache::new(Duration::ZERO);
        cache.insert(1, cfg(10));
        assert_eq!(cache.get(1), None);
    }

    #[test]
    fn test_insert_after_invalidation_is_refused() {
        let cache = ConfigCache::new(Duration::from_secs(60));
        let before = cache.epoch();

        // invalidation lands between the load and the insert
        cache.remove(4);
        assert!(!cache.insert_if_fresh(4, before, cfg(10)));
        assert_eq!(cache.get(4), None);

        assert!(cache.insert_if_fresh(4, cache.epoch(), cfg(25)));
        assert_eq!(cache.get(4), Some(cfg(25)));
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let cache = ConfigCache::new(Duration::from_secs(60));
        cache.insert(3, cfg(20));
        cache.invalidate(3).await.unwrap();
        cache.invalidate(3).await.unwrap();
        assert!(cache.get(3).is_none());
    }
}
