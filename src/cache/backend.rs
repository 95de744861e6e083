//! In-memory entry store.

use super::key::CacheKey;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
struct CacheEntry {
    payload: Value,
    stored_at: Instant,
}

impl CacheEntry {
    /// Valid strictly while `now - stored_at < ttl`.
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Process-wide map of derived key → payload.
///
/// Expired entries are treated as absent on read and only dropped lazily: when looked up, or
/// when an insert finds the store full.
#[derive(Debug)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub fn get(&self, key: &CacheKey, now: Instant, ttl: Duration) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let id = key.as_string();
        match entries.get(&id) {
            Some(entry) if entry.is_fresh(now, ttl) => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(&id);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: &CacheKey, payload: Value, now: Instant, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        let id = key.as_string();
        if !entries.contains_key(&id) && entries.len() >= self.max_entries {
            entries.retain(|_, e| e.is_fresh(now, ttl));
            while entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.stored_at)
                    .map(|(k, _)| k.clone());
                match oldest {
                    Some(k) => {
                        entries.remove(&k);
                    }
                    None => break,
                }
            }
        }
        entries.insert(
            id,
            CacheEntry {
                payload,
                stored_at: now,
            },
        );
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
