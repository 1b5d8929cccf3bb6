//! C1: a `(tenant_id, device_id) -> device registry entry` cache eliminating
//! per-message database lookups on the ingestion hot path (spec.md §4.1).

mod config;
mod stats;

use std::time::Instant;

use dashmap::DashMap;
use opspulse_core::{DeviceId, DeviceKey, DeviceRegistryEntry, TenantId};

pub use config::AuthCacheConfig;
pub use stats::CacheStats;
use stats::Counters;

#[derive(Debug, Clone)]
struct CachedEntry {
    value: DeviceRegistryEntry,
    cached_at: Instant,
}

/// A thread-safe, TTL-bounded cache of device registry rows.
///
/// Only successful lookups are ever stored — a cache miss on the backing
/// registry is never cached, so a device that doesn't exist yet never
/// "poisons" the cache negatively. Eviction, when the cache reaches
/// `max_size`, removes the oldest 10% of entries by `cached_at` rather than
/// a single LRU victim, bounding the cost of staying under the ceiling to
/// one batch pass instead of one eviction per insert.
pub struct AuthCache {
    data: DashMap<DeviceKey, CachedEntry>,
    config: AuthCacheConfig,
    counters: Counters,
}

impl AuthCache {
    #[must_use]
    pub fn new(config: AuthCacheConfig) -> Self {
        Self {
            data: DashMap::new(),
            config,
            counters: Counters::default(),
        }
    }

    /// Look up a device, evicting it first if its TTL has elapsed.
    #[must_use]
    pub fn get(&self, tenant_id: &TenantId, device_id: &DeviceId) -> Option<DeviceRegistryEntry> {
        let key = DeviceKey::new(tenant_id.clone(), device_id.clone());

        let hit = self.data.get(&key).and_then(|entry| {
            if entry.cached_at.elapsed() >= self.config.ttl {
                None
            } else {
                Some(entry.value.clone())
            }
        });

        match hit {
            Some(value) => {
                self.counters.record_hit();
                Some(value)
            }
            None => {
                // Either absent, or present-but-stale; either way it's a miss.
                // Drop the stale row so it doesn't linger until the next sweep.
                self.data.remove_if(&key, |_, entry| entry.cached_at.elapsed() >= self.config.ttl);
                self.counters.record_miss();
                None
            }
        }
    }

    /// Insert or refresh a successful lookup. Idempotent: calling twice with
    /// the same value is equivalent to calling once, other than resetting
    /// `cached_at`.
    pub fn put(&self, tenant_id: &TenantId, device_id: &DeviceId, entry: DeviceRegistryEntry) {
        let key = DeviceKey::new(tenant_id.clone(), device_id.clone());
        self.data.insert(
            key,
            CachedEntry {
                value: entry,
                cached_at: Instant::now(),
            },
        );
        self.maybe_evict();
    }

    /// Remove a device's cached entry, e.g. after an admin revokes it.
    pub fn invalidate(&self, tenant_id: &TenantId, device_id: &DeviceId) {
        let key = DeviceKey::new(tenant_id.clone(), device_id.clone());
        self.data.remove(&key);
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.data.len())
    }

    fn maybe_evict(&self) {
        if self.data.len() < self.config.max_size {
            return;
        }
        let evict_count = (self.data.len() / 10).max(1);
        let mut by_age: Vec<(DeviceKey, Instant)> = self
            .data
            .iter()
            .map(|r| (r.key().clone(), r.value().cached_at))
            .collect();
        by_age.sort_by_key(|(_, cached_at)| *cached_at);
        tracing::debug!(evict_count, size = self.data.len(), "auth cache at ceiling, evicting oldest");
        for (key, _) in by_age.into_iter().take(evict_count) {
            self.data.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opspulse_core::DeviceStatus;
    use std::time::Duration;

    fn entry(site: &str) -> DeviceRegistryEntry {
        DeviceRegistryEntry {
            tenant_id: TenantId::new("t1"),
            device_id: DeviceId::new("d1"),
            site_id: opspulse_core::SiteId::new(site),
            status: DeviceStatus::Active,
            provision_token_hash: "hash".into(),
            subscription_id: None,
        }
    }

    #[test]
    fn put_then_get_returns_same_entry() {
        let cache = AuthCache::new(AuthCacheConfig::default());
        let t = TenantId::new("t1");
        let d = DeviceId::new("d1");
        cache.put(&t, &d, entry("s1"));
        let got = cache.get(&t, &d).unwrap();
        assert_eq!(got.site_id.as_str(), "s1");
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn miss_is_not_cached() {
        let cache = AuthCache::new(AuthCacheConfig::default());
        let t = TenantId::new("t1");
        let d = DeviceId::new("d1");
        assert!(cache.get(&t, &d).is_none());
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let cache = AuthCache::new(AuthCacheConfig {
            ttl: Duration::from_millis(1),
            max_size: 10_000,
        });
        let t = TenantId::new("t1");
        let d = DeviceId::new("d1");
        cache.put(&t, &d, entry("s1"));
        std::thread::sleep(Duration::from_millis(10));
        assert!(cache.get(&t, &d).is_none());
    }

    #[test]
    fn invalidate_forces_miss() {
        let cache = AuthCache::new(AuthCacheConfig::default());
        let t = TenantId::new("t1");
        let d = DeviceId::new("d1");
        cache.put(&t, &d, entry("s1"));
        cache.invalidate(&t, &d);
        assert!(cache.get(&t, &d).is_none());
    }

    #[test]
    fn eviction_trims_oldest_tenth_at_ceiling() {
        let cache = AuthCache::new(AuthCacheConfig {
            ttl: Duration::from_secs(60),
            max_size: 10,
        });
        for i in 0..10 {
            let t = TenantId::new("t1");
            let d = DeviceId::new(format!("d{i}"));
            cache.put(&t, &d, entry("s1"));
        }
        // The 10th insert hits the ceiling and evicts floor(10/10)=1 oldest.
        assert_eq!(cache.stats().size, 9);
        let t = TenantId::new("t1");
        assert!(cache.get(&t, &DeviceId::new("d0")).is_none());
        assert!(cache.get(&t, &DeviceId::new("d9")).is_some());
    }

    #[test]
    fn concurrent_access_is_safe() {
        use std::sync::Arc;
        let cache = Arc::new(AuthCache::new(AuthCacheConfig::default()));
        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                let t = TenantId::new("t1");
                let d = DeviceId::new(format!("d{i}"));
                cache.put(&t, &d, entry("s1"));
                cache.get(&t, &d);
                cache.invalidate(&t, &d);
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
