//! Bounded in-memory caches whose entries expire after a fixed time.
//!
//! [`ExpiringCache`] is the generic building block. [`ArtifactCaches`]
//! bundles the three instances a reader keeps around: extension modules,
//! extension libraries and chapter payloads.

mod artifacts;
mod config;
mod expiring;
mod stats;

pub use artifacts::{ArtifactCacheStats, ArtifactCaches};
pub use config::{
    CacheConfig, DEFAULT_CACHE_TTL, DEFAULT_MAX_CHAPTERS, DEFAULT_MAX_EXTENSIONS,
    DEFAULT_MAX_LIBRARIES,
};
pub use expiring::{CacheEntry, ExpiringCache};
pub use stats::CacheStats;
