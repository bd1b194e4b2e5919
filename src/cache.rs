//! Memoization of search results keyed by the exact query string
//!
//! Unbounded by default, which suits a short browsing session. A capacity
//! turns it into an [`LruCache`] for long-running processes.

use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use tracing::trace;

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

enum Store<V> {
    Unbounded(HashMap<String, V>),
    Bounded(LruCache<String, V>),
    Disabled,
}

pub struct QueryCache<V> {
    store: Store<V>,
    stats: CacheStats,
}

impl<V: Clone> QueryCache<V> {
    /// `None` keeps every entry; `Some(0)` disables caching
    pub fn new(capacity: Option<usize>) -> Self {
        let store = match capacity {
            None => Store::Unbounded(HashMap::new()),
            Some(n) => match NonZeroUsize::new(n) {
                Some(n) => Store::Bounded(LruCache::new(n)),
                None => Store::Disabled,
            },
        };
        Self {
            store,
            stats: CacheStats::default(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        let found = match &mut self.store {
            Store::Unbounded(entries) => entries.get(key).cloned(),
            Store::Bounded(entries) => entries.get(key).cloned(),
            Store::Disabled => None,
        };
        match found {
            Some(value) => {
                self.stats.hits += 1;
                trace!("query cache hit: {:?}", key);
                Some(value)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: &str, value: V) {
        match &mut self.store {
            Store::Unbounded(entries) => {
                entries.insert(key.to_string(), value);
            }
            Store::Bounded(entries) => {
                // `push` hands back either the replaced entry or the evicted one
                if let Some((evicted, _)) = entries.push(key.to_string(), value) {
                    if evicted != key {
                        self.stats.evictions += 1;
                        trace!("query cache evicted: {:?}", evicted);
                    }
                }
            }
            Store::Disabled => {}
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match &self.store {
            Store::Unbounded(entries) => entries.contains_key(key),
            Store::Bounded(entries) => entries.contains(key),
            Store::Disabled => false,
        }
    }

    pub fn len(&self) -> usize {
        match &self.store {
            Store::Unbounded(entries) => entries.len(),
            Store::Bounded(entries) => entries.len(),
            Store::Disabled => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match &mut self.store {
            Store::Unbounded(entries) => entries.clear(),
            Store::Bounded(entries) => entries.clear(),
            Store::Disabled => {}
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_keeps_everything() {
        let mut cache = QueryCache::new(None);
        for i in 0..100 {
            cache.insert(&format!("q{}", i), i);
        }
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.get("q0"), Some(0));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_bounded_evicts_least_recently_used() {
        let mut cache = QueryCache::new(Some(2));
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert_eq!(cache.get("a"), Some(1));
        cache.insert("c", 3);

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_reinsert_refreshes_entry() {
        let mut cache = QueryCache::new(Some(2));
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("a", 10);
        cache.insert("c", 3);
        assert_eq!(cache.get("a"), Some(10));
        assert!(!cache.contains("b"));
        // replacing "a" is not an eviction
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_zero_capacity_disables() {
        let mut cache = QueryCache::new(Some(0));
        cache.insert("a", 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_hit_miss_counters() {
        let mut cache = QueryCache::new(None);
        assert_eq!(cache.get("x"), None);
        cache.insert("x", "value");
        assert_eq!(cache.get("x"), Some("value"));
        assert_eq!(cache.get("x"), Some("value"));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 2,
                misses: 1,
                evictions: 0
            }
        );
    }

    #[test]
    fn test_clear() {
        let mut cache = QueryCache::new(Some(4));
        cache.insert("a", 1);
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains("a"));
    }
}
