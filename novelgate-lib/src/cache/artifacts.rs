use bytes::Bytes;
use serde::Serialize;

use super::{CacheConfig, CacheStats, ExpiringCache};
use crate::{ArtifactKind, ChapterId, ExtensionId, Result};

/// The in-memory caches of a reader, one per [`ArtifactKind`].
///
/// The three caches are independent; they only share their TTL.
#[derive(Debug)]
pub struct ArtifactCaches {
    /// Extension modules by extension id
    pub extensions: ExpiringCache<ExtensionId, Bytes>,
    /// Library source code by library name
    pub libraries: ExpiringCache<String, String>,
    /// Chapter payloads by chapter id
    pub chapters: ExpiringCache<ChapterId, Bytes>,
}

impl ArtifactCaches {
    /// Build all caches from `config`.
    ///
    /// # Errors
    ///
    /// Fails if any of the configured capacities is 0.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Ok(Self {
            extensions: ExpiringCache::named(
                ArtifactKind::Extension.as_str(),
                config.max_extensions,
                config.ttl,
            )?,
            libraries: ExpiringCache::named(
                ArtifactKind::Library.as_str(),
                config.max_libraries,
                config.ttl,
            )?,
            chapters: ExpiringCache::named(
                ArtifactKind::Chapter.as_str(),
                config.max_chapters,
                config.ttl,
            )?,
        })
    }

    /// Remove expired entries from all caches
    pub fn recycle(&self) {
        self.extensions.recycle();
        self.libraries.recycle();
        self.chapters.recycle();
    }

    /// Empty all caches
    pub fn clear(&self) {
        self.extensions.clear();
        self.libraries.clear();
        self.chapters.clear();
    }

    /// Statistics of all caches
    #[must_use]
    pub fn stats(&self) -> ArtifactCacheStats {
        ArtifactCacheStats {
            extensions: self.extensions.stats(),
            libraries: self.libraries.stats(),
            chapters: self.chapters.stats(),
        }
    }
}

/// [`CacheStats`] of every artifact cache
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArtifactCacheStats {
    /// Extension module cache
    pub extensions: CacheStats,
    /// Library cache
    pub libraries: CacheStats,
    /// Chapter cache
    pub chapters: CacheStats,
}

impl ArtifactCacheStats {
    /// Statistics of the cache holding `kind`
    #[must_use]
    pub const fn get(&self, kind: ArtifactKind) -> &CacheStats {
        match kind {
            ArtifactKind::Extension => &self.extensions,
            ArtifactKind::Library => &self.libraries,
            ArtifactKind::Chapter => &self.chapters,
        }
    }
}
