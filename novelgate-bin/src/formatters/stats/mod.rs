mod compact;
mod json;

pub(crate) use compact::Compact;
pub(crate) use json::Json;

use anyhow::Result;
use novelgate_lib::cache::ArtifactCacheStats;
use novelgate_lib::ratelimit::HostStatsMap;
use serde::Serialize;

use crate::stats::FetchStats;

/// Everything reported at the end of a run
#[derive(Debug, Serialize)]
pub(crate) struct OutputStats {
    pub(crate) fetch: FetchStats,
    pub(crate) caches: ArtifactCacheStats,
    pub(crate) hosts: HostStatsMap,
}

pub(crate) trait StatsFormatter {
    /// Format the statistics of a run
    fn format(&self, stats: OutputStats) -> Result<String>;
}
