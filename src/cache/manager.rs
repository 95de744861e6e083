//! Response cache with get-or-compute semantics.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::backend::MemoryCache;
use super::key::CacheKey;
use crate::clock::{self, Clock};
use crate::Result;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            enabled: true,
            max_entries: 1024,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    stores: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// A value together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub served_from_cache: bool,
}

/// TTL-bounded memo in front of billable provider calls.
#[derive(Debug)]
pub struct ResponseCache {
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    store: MemoryCache,
    stats: AtomicStats,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, clock::system())
    }

    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let store = MemoryCache::new(config.max_entries);
        Self {
            config,
            clock,
            store,
            stats: AtomicStats::default(),
        }
    }

    /// Return the cached payload for `key` while fresh; otherwise run `compute` and store its
    /// result. Failed computes are never stored.
    pub async fn get_or_compute<T, F, Fut>(&self, key: &CacheKey, compute: F) -> Result<Cached<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.config.enabled {
            if let Some(payload) = self.store.get(key, self.clock.now(), self.config.ttl) {
                match serde_json::from_value::<T>(payload) {
                    Ok(value) => {
                        self.stats.hits.fetch_add(1, Ordering::Relaxed);
                        debug!(feature = key.feature.as_str(), "response cache hit");
                        return Ok(Cached {
                            value,
                            served_from_cache: true,
                        });
                    }
                    Err(_) => {
                        self.stats.errors.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            debug!(feature = key.feature.as_str(), "response cache miss");
        }

        let value = compute().await?;

        if self.config.enabled {
            match serde_json::to_value(&value) {
                Ok(payload) => {
                    self.store
                        .insert(key, payload, self.clock.now(), self.config.ttl);
                    self.stats.stores.fetch_add(1, Ordering::Relaxed);
                }
                Err(_) => {
                    self.stats.errors.fetch_add(1, Ordering::Relaxed);
                }
            }
        }

        Ok(Cached {
            value,
            served_from_cache: false,
        })
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
