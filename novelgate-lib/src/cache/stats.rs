use serde::Serialize;

/// Point-in-time statistics of a single [`ExpiringCache`](super::ExpiringCache)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Live entries at the time of the snapshot
    pub entries: usize,
    /// Maximum number of entries
    pub capacity: usize,
    /// Lookups that returned a value
    pub hits: u64,
    /// Lookups that returned nothing
    pub misses: u64,
    /// Entries removed to make room for a new key
    pub evictions: u64,
    /// Entries removed because their TTL ran out
    pub expirations: u64,
}

impl CacheStats {
    /// Total number of lookups
    #[must_use]
    pub const fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Share of lookups that were hits, `None` before the first lookup
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_ratio(&self) -> Option<f64> {
        match self.lookups() {
            0 => None,
            lookups => Some(self.hits as f64 / lookups as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_ratio() {
        let mut stats = CacheStats::default();
        assert_eq!(stats.hit_ratio(), None);

        stats.hits = 3;
        stats.misses = 1;
        assert_eq!(stats.lookups(), 4);
        assert_eq!(stats.hit_ratio(), Some(0.75));
    }
}
