//! Short-TTL in-process cache.
//!
//! Smooths burst traffic in front of the distributed cache. One TTL fixed at
//! construction; stale entries are reclaimed lazily on access. There is no
//! background sweeper and no size bound.

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A process-local string-keyed cache with a single fixed TTL.
///
/// A TTL of zero disables the cache: both operations become no-ops. Safe for
/// concurrent use from the request path; `get`/`set` never block on I/O.
pub struct Microcache<V> {
    ttl: Duration,
    entries: DashMap<String, Entry<V>>,
}

impl<V: Clone> Microcache<V> {
    /// Create a cache whose entries live for `ttl` after each `set`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Look up an unexpired value. An expired entry is removed and reported
    /// as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        if self.ttl.is_zero() {
            return None;
        }
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(entry.value.clone());
            }
            drop(entry);
            // Re-check under the entry lock: a concurrent `set` may have
            // refreshed the key since the read above.
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
        }
        None
    }

    /// Store a value, replacing any previous entry for the key.
    pub fn set(&self, key: impl Into<String>, value: V) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Number of live-or-stale entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_returns_values_within_ttl() {
        let cache = Microcache::new(Duration::from_secs(60));
        cache.set("k", 7);
        assert_eq!(cache.get("k"), Some(7));
        assert_eq!(cache.get("other"), None);
    }

    #[test]
    fn set_replaces_existing_entry() {
        let cache = Microcache::new(Duration::from_secs(60));
        cache.set("k", 1);
        cache.set("k", 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_ttl_disables_the_cache() {
        let cache = Microcache::new(Duration::ZERO);
        cache.set("k", 7);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn expired_entries_are_removed_on_access() {
        let cache = Microcache::new(Duration::from_millis(1));
        cache.set("k", 7);
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "expired entry should be reclaimed");
    }

    #[test]
    fn concurrent_readers_and_writers_do_not_panic() {
        let cache = std::sync::Arc::new(Microcache::new(Duration::from_millis(5)));
        let mut handles = Vec::new();
        for t in 0..4 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("k{}", i % 17);
                    if (i + t) % 3 == 0 {
                        cache.set(key, i);
                    } else {
                        let _ = cache.get(&key);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
