use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::CacheStats;
use crate::{ErrorKind, Result};

/// A cached value together with the moment it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cached artifact
    pub value: V,
    /// Set on insertion and reset by every overwrite
    pub inserted_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
        }
    }

    /// Whether the entry is younger than `ttl` at `now`
    #[must_use]
    pub fn is_live(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.inserted_at) < ttl
    }
}

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Keys of `entries`, oldest insertion first.
    /// Insertion times never decrease from front to back.
    order: VecDeque<K>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    /// Drop every entry that is no longer live.
    /// Since `order` is sorted by insertion time, these form a prefix of it.
    fn recycle(&mut self, ttl: Duration) {
        let now = Instant::now();
        while let Some(oldest) = self.order.front() {
            if self
                .entries
                .get(oldest)
                .is_some_and(|entry| entry.is_live(now, ttl))
            {
                break;
            }
            if let Some(key) = self.order.pop_front() {
                self.entries.remove(&key);
                self.expirations += 1;
            }
        }
    }

    fn forget(&mut self, key: &K) {
        if let Some(position) = self.order.iter().position(|k| k == key) {
            self.order.remove(position);
        }
    }
}

/// A bounded key-value store whose entries expire after a fixed TTL.
///
/// * At most `capacity` entries are held. Inserting a new key into a full
///   cache evicts the entry that was inserted first (not the least recently
///   used one).
/// * An entry is live for `ttl` after its last `put`. Expired entries are
///   removed lazily on the next access, there is no background sweep.
/// * Overwriting a key refreshes its age and makes it the newest entry.
///
/// All operations take a single lock for their whole duration, so the cache
/// can be shared between tasks and threads as is. The lock is never held
/// across an `.await`.
///
/// # Examples
///
/// ```
/// use novelgate_lib::cache::ExpiringCache;
/// use std::time::Duration;
///
/// let cache = ExpiringCache::new(2, Duration::from_secs(60))?;
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.put("c", 3);
///
/// assert_eq!(cache.get(&"a"), None);
/// assert_eq!(cache.get(&"b"), Some(2));
/// assert_eq!(cache.get(&"c"), Some(3));
/// # Ok::<(), novelgate_lib::ErrorKind>(())
/// ```
#[derive(Debug)]
pub struct ExpiringCache<K, V> {
    inner: Mutex<Inner<K, V>>,
    capacity: usize,
    ttl: Duration,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ZeroCapacity`] if `capacity` is 0.
    pub fn new(capacity: usize, ttl: Duration) -> Result<Self> {
        Self::named("expiring", capacity, ttl)
    }

    /// Like [`ExpiringCache::new`], naming the cache in errors
    pub(crate) fn named(kind: &'static str, capacity: usize, ttl: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(ErrorKind::ZeroCapacity { kind });
        }
        Ok(Self {
            inner: Mutex::new(Inner::with_capacity(capacity)),
            capacity,
            ttl,
        })
    }

    /// Look up a live entry.
    ///
    /// Expired entries are removed first, so an expired value is never
    /// returned.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.lock();
        inner.recycle(self.ttl);

        let value = inner.entries.get(key).map(|entry| entry.value.clone());
        if value.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        value
    }

    /// Insert or overwrite an entry.
    ///
    /// Overwriting keeps the number of entries unchanged. Inserting a new key
    /// into a full cache first evicts the oldest entry.
    pub fn put(&self, key: K, value: V) {
        let mut inner = self.lock();

        if let Some(entry) = inner.entries.get_mut(&key) {
            *entry = CacheEntry::new(value);
            inner.forget(&key);
            inner.order.push_back(key);
            return;
        }

        if inner.entries.len() >= self.capacity
            && let Some(oldest) = inner.order.pop_front()
        {
            inner.entries.remove(&oldest);
            inner.evictions += 1;
            log::trace!(
                "Cache full ({} entries), evicted oldest entry",
                self.capacity
            );
        }

        inner.entries.insert(key.clone(), CacheEntry::new(value));
        inner.order.push_back(key);
        debug_assert!(inner.entries.len() <= self.capacity);
        debug_assert_eq!(inner.entries.len(), inner.order.len());
    }

    /// Whether an entry for `key` is stored, live or not
    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Remove an entry, returning whether there was one
    pub fn remove(&self, key: &K) -> bool {
        let mut inner = self.lock();
        let removed = inner.entries.remove(key).is_some();
        if removed {
            inner.forget(key);
        }
        removed
    }

    /// Remove all expired entries
    pub fn recycle(&self) {
        self.lock().recycle(self.ttl);
    }

    /// Remove all entries. Counters are kept.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Number of stored entries, including expired ones not yet recycled
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether no entries are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Time an entry stays live after insertion
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Recycle, then take a snapshot of the statistics
    pub fn stats(&self) -> CacheStats {
        let mut inner = self.lock();
        inner.recycle(self.ttl);
        CacheStats {
            entries: inner.entries.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }

    /// Acquire the lock, recovering from poisoning
    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use rand::Rng;
    use std::sync::Arc;
    use tokio::task::JoinSet;

    const TTL: Duration = Duration::from_millis(1000);

    #[test]
    fn test_zero_capacity() {
        let cache = ExpiringCache::<u32, u32>::new(0, TTL);
        assert!(matches!(cache, Err(ErrorKind::ZeroCapacity { .. })));
    }

    #[test]
    fn test_capacity_is_never_exceeded() {
        let cache = ExpiringCache::new(3, TTL).unwrap();
        for i in 0..50 {
            cache.put(i % 7, i);
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        // every key comes back only after three others were inserted
        assert_eq!(cache.stats().evictions, 47);
    }

    #[tokio::test]
    async fn test_evict_earliest_inserted() {
        let cache = ExpiringCache::new(2, TTL).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_eviction_ignores_access_order() {
        let cache = ExpiringCache::new(3, TTL).unwrap();
        for key in ["first", "second", "third"] {
            cache.put(key, key.len());
        }
        // reading does not protect an entry
        assert_eq!(cache.get(&"first"), Some(5));
        cache.put("fourth", 6);

        assert!(!cache.contains(&"first"));
        assert!(cache.contains(&"second"));
        assert!(cache.contains(&"third"));
        assert!(cache.contains(&"fourth"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entries_are_never_returned() {
        let cache = ExpiringCache::new(4, TTL).unwrap();
        cache.put(1, "one");

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert_eq!(cache.get(&1), Some("one"));

        tokio::time::advance(Duration::from_millis(1)).await;
        // still stored until the next access cleans up
        assert!(cache.contains(&1));
        assert_eq!(cache.get(&1), None);
        assert!(!cache.contains(&1));
        assert_eq!(cache.stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_refreshes_age() {
        let cache = ExpiringCache::new(2, TTL).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);

        tokio::time::advance(Duration::from_millis(600)).await;
        cache.put("a", 10);
        assert_eq!(cache.len(), 2);

        tokio::time::advance(Duration::from_millis(600)).await;
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"a"), Some(10));
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_overwrite_makes_key_newest() {
        let cache = ExpiringCache::new(2, TTL).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 3);
        cache.put("c", 4);

        assert_eq!(cache.get(&"a"), Some(3));
        assert_eq!(cache.get(&"b"), None);
        assert_eq!(cache.get(&"c"), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recycle_removes_only_expired() {
        let cache = ExpiringCache::new(4, TTL).unwrap();
        cache.put("old", 1);
        tokio::time::advance(Duration::from_millis(700)).await;
        cache.put("new", 2);
        tokio::time::advance(Duration::from_millis(300)).await;

        cache.recycle();

        assert!(!cache.contains(&"old"));
        assert!(cache.contains(&"new"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = ExpiringCache::new(4, TTL).unwrap();
        cache.put(1, 1);
        cache.put(2, 2);

        assert!(cache.remove(&1));
        assert!(!cache.remove(&1));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 4);
        assert_eq!(cache.ttl(), TTL);
    }

    #[test]
    fn test_removed_key_is_not_evicted_twice() {
        let cache = ExpiringCache::new(2, TTL).unwrap();
        cache.put("a", 1);
        cache.put("b", 2);
        cache.remove(&"a");
        cache.put("c", 3);

        assert_eq!(cache.stats().evictions, 0);
        assert_eq!(cache.get(&"b"), Some(2));
        assert_eq!(cache.get(&"c"), Some(3));
    }

    #[test]
    fn test_round_trip_bytes() {
        let cache = ExpiringCache::new(10, TTL).unwrap();
        let module = Bytes::from_static(b"\x00asm\x01\x00\x00\x00 function search() {}");

        cache.put("ext:42".to_string(), module.clone());

        assert_eq!(cache.get(&"ext:42".to_string()), Some(module));
    }

    #[test]
    fn test_stats() {
        let cache = ExpiringCache::new(1, TTL).unwrap();
        cache.put(1, ());
        cache.put(2, ());
        cache.get(&1);
        cache.get(&2);

        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                capacity: 1,
                hits: 1,
                misses: 1,
                evictions: 1,
                expirations: 0,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_access() {
        const CAPACITY: usize = 8;
        let cache = Arc::new(ExpiringCache::new(CAPACITY, Duration::from_secs(60)).unwrap());

        let mut tasks = JoinSet::new();
        for task in 0..16u32 {
            let cache = cache.clone();
            tasks.spawn(async move {
                for round in 0..500u32 {
                    let key = rand::rng().random_range(0..32u32);
                    if round % 3 == 0 {
                        cache.get(&key);
                    } else {
                        cache.put(key, task * 1000 + round);
                    }
                    assert!(cache.len() <= CAPACITY);
                    tokio::task::yield_now().await;
                }
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert!(cache.len() <= CAPACITY);
        for key in 0..32u32 {
            if cache.contains(&key) {
                assert!(cache.get(&key).is_some());
            }
        }

        for key in 100..100 + CAPACITY as u32 {
            cache.put(key, key);
        }
        for key in 100..100 + CAPACITY as u32 {
            assert_eq!(cache.get(&key), Some(key));
        }
    }
}
