//! Process-wide enrichment cache with per-entry TTL.
//!
//! Contact lookups against the CRM are expensive (rate limited, paced), so
//! connectors cache enrichment payloads here keyed by tenant. Expired entries
//! are evicted lazily on read and reaped by an optional background sweeper.

use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

/// Concurrent TTL cache for enrichment payloads.
///
/// Keys are namespaced by the caller (connectors use `"{tenant}:contact:{id}"`)
/// so a single process can serve multiple tenants without collisions.
#[derive(Debug, Default)]
pub struct EnrichmentCache {
    store: DashMap<String, CacheEntry>,
}

impl EnrichmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw cached value, evicting it first if expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                trace!(key, "cache hit");
                return Some(entry.value.clone());
            }
        } else {
            return None;
        }

        // Expired: remove outside the read guard to avoid deadlocking the shard.
        self.store.remove(key);
        trace!(key, "cache entry expired");
        None
    }

    /// Get a cached value deserialized into `T`. Entries that no longer
    /// deserialize (schema drift) are treated as misses.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        serde_json::from_value(value).ok()
    }

    /// Insert a value with an optional TTL. `None` means the entry never
    /// expires (until deleted or the process exits).
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Option<Duration>) {
        let entry = CacheEntry { value, expires_at: ttl.map(|ttl| Instant::now() + ttl) };
        self.store.insert(key.into(), entry);
    }

    pub fn delete(&self, key: &str) -> bool {
        self.store.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Number of entries currently stored, including not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Remove every expired entry. Returns the number of entries evicted.
    pub fn sweep(&self) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| !entry.is_expired());
        let evicted = before - self.store.len();
        if evicted > 0 {
            debug!(evicted, "swept expired cache entries");
        }
        evicted
    }

    /// Spawn a background task that periodically sweeps expired entries.
    ///
    /// The task holds only a weak reference, so it stops on its own once the
    /// last strong handle to the cache is dropped.
    pub fn spawn_sweeper(cache: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(cache);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                cache.sweep();
            }
        })
    }
}
