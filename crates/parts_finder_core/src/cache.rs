//! crates/parts_finder_core/src/cache.rs
//!
//! A small bounded, time-limited cache of search results keyed by query fingerprint.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::domain::{Product, SearchSource};
use crate::query::query_fingerprint;

pub const DEFAULT_CAPACITY: usize = 100;
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// What is remembered for a query.
#[derive(Debug, Clone)]
pub struct CachedResults {
    pub products: Vec<Product>,
    pub source: SearchSource,
}

struct CacheEntry {
    results: CachedResults,
    inserted_at: Instant,
}

pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    capacity: usize,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    /// Returns the cached results for `query` if they are still fresh.
    /// A stale entry is removed.
    pub fn get(&self, query: &str) -> Option<CachedResults> {
        let key = query_fingerprint(query);
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.results.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores results for `query`, evicting the oldest entry once over capacity.
    pub fn insert(&self, query: &str, results: CachedResults) {
        let key = query_fingerprint(query);
        let mut entries = self.entries.lock();
        entries.insert(
            key,
            CacheEntry {
                results,
                inserted_at: Instant::now(),
            },
        );

        if entries.len() > self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}
