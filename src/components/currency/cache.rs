use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// Least-recently-used cache with a fixed capacity and time-to-live.
///
/// Expired entries are never returned and are dropped when looked up. When a
/// new key is inserted into a full cache, expired entries are purged first and
/// then the least recently used entry is evicted.
pub struct BoundedCache<K: Hash + Eq, V> {
    entries: LruCache<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// A capacity of zero is treated as one
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            ttl,
        }
    }

    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.get_at(key, Instant::now())
    }

    /// Look up a fresh entry and mark it as recently used
    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<&V> {
        let ttl = self.ttl;
        let expired = self
            .entries
            .peek(key)
            .map(|entry| is_expired(entry, ttl, now))?;

        if expired {
            self.entries.pop(key);
            return None;
        }

        self.entries.get(key).map(|entry| &entry.value)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        if !self.entries.contains(&key) && self.entries.len() >= self.entries.cap().get() {
            self.purge_expired(now);
        }
        self.entries.put(
            key,
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    pub fn invalidate(&mut self, key: &K) -> Option<V> {
        self.entries.pop(key).map(|entry| entry.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        let expired: Vec<K> = self
            .entries
            .iter()
            .filter(|(_, entry)| is_expired(entry, ttl, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            self.entries.pop(&key);
        }
    }
}

fn is_expired<V>(entry: &CacheEntry<V>, ttl: Duration, now: Instant) -> bool {
    now.saturating_duration_since(entry.inserted_at) >= ttl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_expiry() {
        let start = Instant::now();
        let mut cache = BoundedCache::new(4, Duration::from_secs(60));
        cache.insert_at("EUR", 1, start);

        assert_eq!(cache.get_at(&"EUR", start + Duration::from_secs(59)), Some(&1));
        assert_eq!(cache.get_at(&"EUR", start + Duration::from_secs(60)), None);

        // Expired lookups drop the entry
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let start = Instant::now();
        let mut cache = BoundedCache::new(2, Duration::from_secs(600));
        cache.insert_at("EUR", 1, start);
        cache.insert_at("USD", 2, start + Duration::from_secs(1));
        cache.insert_at("GBP", 3, start + Duration::from_secs(2));

        let now = start + Duration::from_secs(3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at(&"EUR", now), None);
        assert_eq!(cache.get_at(&"USD", now), Some(&2));
        assert_eq!(cache.get_at(&"GBP", now), Some(&3));
    }

    #[test]
    fn test_recently_read_entry_survives_eviction() {
        let start = Instant::now();
        let mut cache = BoundedCache::new(2, Duration::from_secs(600));
        cache.insert_at("EUR", 1, start);
        cache.insert_at("USD", 2, start + Duration::from_secs(1));

        // EUR is older but hot
        for i in 0..8 {
            assert_eq!(cache.get_at(&"EUR", start + Duration::from_secs(2 + i)), Some(&1));
        }

        cache.insert_at("GBP", 3, start + Duration::from_secs(20));

        let now = start + Duration::from_secs(21);
        assert_eq!(cache.get_at(&"EUR", now), Some(&1));
        assert_eq!(cache.get_at(&"USD", now), None);
        assert_eq!(cache.get_at(&"GBP", now), Some(&3));
    }

    #[test]
    fn test_expired_entries_purged_before_eviction() {
        let start = Instant::now();
        let mut cache = BoundedCache::new(2, Duration::from_secs(10));
        cache.insert_at("USD", 2, start);
        cache.insert_at("EUR", 1, start + Duration::from_secs(5));

        // Touch USD so EUR is the least recently used, then let USD expire
        assert_eq!(cache.get_at(&"USD", start + Duration::from_secs(6)), Some(&2));
        cache.insert_at("GBP", 3, start + Duration::from_secs(12));

        let now = start + Duration::from_secs(12);
        assert_eq!(cache.get_at(&"EUR", now), Some(&1));
        assert_eq!(cache.get_at(&"GBP", now), Some(&3));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let start = Instant::now();
        let mut cache = BoundedCache::new(2, Duration::from_secs(600));
        cache.insert_at("EUR", 1, start);
        cache.insert_at("USD", 2, start);
        cache.insert_at("EUR", 10, start + Duration::from_secs(1));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_at(&"EUR", start + Duration::from_secs(2)), Some(&10));
        assert_eq!(cache.invalidate(&"USD"), Some(2));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let start = Instant::now();
        let mut cache = BoundedCache::new(0, Duration::from_secs(600));
        cache.insert_at("EUR", 1, start);
        cache.insert_at("USD", 2, start);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at(&"USD", start), Some(&2));
    }
}
