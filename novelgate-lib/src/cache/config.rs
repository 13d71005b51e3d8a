use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of cached extension modules
pub const DEFAULT_MAX_EXTENSIONS: usize = 10;
/// Default number of cached extension libraries
pub const DEFAULT_MAX_LIBRARIES: usize = 20;
/// Default number of cached chapters
pub const DEFAULT_MAX_CHAPTERS: usize = 100;
/// Default time an artifact stays cached
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Sizes and lifetime of the [`ArtifactCaches`](super::ArtifactCaches)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of extension modules
    pub max_extensions: usize,
    /// Maximum number of extension libraries
    pub max_libraries: usize,
    /// Maximum number of chapter payloads
    pub max_chapters: usize,
    /// Time an entry stays live after it was stored
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_extensions: DEFAULT_MAX_EXTENSIONS,
            max_libraries: DEFAULT_MAX_LIBRARIES,
            max_chapters: DEFAULT_MAX_CHAPTERS,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}
