use anyhow::Result;
use console::Style;
use novelgate_lib::cache::CacheStats;
use std::{
    fmt::{self, Display},
    sync::LazyLock,
    time::Duration,
};

use crate::formatters::color::{BOLD_GREEN, BOLD_PINK, BOLD_YELLOW, DIM, NORMAL, PINK, YELLOW, color};

use super::{OutputStats, StatsFormatter};

struct CompactStats {
    stats: OutputStats,
}

impl Display for CompactStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let OutputStats {
            fetch,
            caches,
            hosts,
        } = &self.stats;

        if !fetch.failures.is_empty() {
            let noun = if fetch.failures.len() == 1 {
                "target"
            } else {
                "targets"
            };
            color!(
                f,
                BOLD_PINK,
                "Could not fetch {} {noun}. Find details below.\n\n",
                fetch.failures.len()
            )?;

            for failure in &fetch.failures {
                color!(f, BOLD_YELLOW, "[{}]", failure.target)?;
                color!(f, DIM, " pass {}", failure.pass)?;
                writeln!(f)?;
                color!(f, PINK, "  {} | {}\n", failure.url, failure.error)?;
            }
            writeln!(f)?;
        }

        color!(f, NORMAL, "🔍 {} Total", fetch.total)?;
        let duration = Duration::from_secs(fetch.duration_secs);
        color!(f, DIM, " (in {})", humantime::format_duration(duration))?;
        color!(f, BOLD_GREEN, " ✅ {} OK", fetch.successful)?;

        let err_str = if fetch.errors == 1 { "Error" } else { "Errors" };
        color!(f, BOLD_PINK, " 🚫 {} {}", fetch.errors, err_str)?;
        write_if_any(fetch.cancelled, "⏳", "Cancelled", &BOLD_YELLOW, f)?;
        write_if_any(fetch.retries, "🔁", "Retries", &YELLOW, f)?;
        writeln!(f)?;

        writeln!(f)?;
        writeln!(f, "🗃 Cache")?;
        write_cache_line(f, "extensions", &caches.extensions)?;
        write_cache_line(f, "libraries", &caches.libraries)?;
        write_cache_line(f, "chapters", &caches.chapters)?;

        if !hosts.is_empty() {
            writeln!(f)?;
            writeln!(f, "📊 Per-host Statistics")?;
            color!(f, DIM, "{}\n", "─".repeat(60))?;

            let sorted_hosts = hosts.sorted();
            let hostname_width = sorted_hosts
                .iter()
                .map(|(host, _)| host.as_str().len() + 2)
                .max()
                .unwrap_or(0)
                .max(10);

            for (host, stats) in sorted_hosts {
                let average_wait = stats
                    .average_wait()
                    .map_or_else(|| "N/A".to_string(), |d| format!("{}ms", d.as_millis()));
                color!(
                    f,
                    NORMAL,
                    "{:<width$} │ {:>6} reqs │ {:>8} avg wait │ {:>3} cooldowns\n",
                    host.as_str(),
                    stats.admissions,
                    average_wait,
                    stats.cooldowns,
                    width = hostname_width
                )?;
            }
        }

        Ok(())
    }
}

fn write_cache_line(f: &mut fmt::Formatter<'_>, name: &str, stats: &CacheStats) -> fmt::Result {
    color!(
        f,
        NORMAL,
        "  {:<11} {:>4}/{:<4} entries │ {:>5} hits │ {:>5} misses",
        name,
        stats.entries,
        stats.capacity,
        stats.hits,
        stats.misses
    )?;
    if let Some(ratio) = stats.hit_ratio() {
        color!(f, DIM, " │ {:.0}% hit ratio", ratio * 100.0)?;
    }
    if stats.evictions > 0 || stats.expirations > 0 {
        color!(
            f,
            DIM,
            " │ {} evicted, {} expired",
            stats.evictions,
            stats.expirations
        )?;
    }
    writeln!(f)
}

fn write_if_any<T: Display + Default + PartialOrd>(
    value: T,
    symbol: &str,
    text: &str,
    style: &LazyLock<Style>,
    f: &mut fmt::Formatter<'_>,
) -> Result<(), fmt::Error> {
    if value > T::default() {
        color!(f, style, " {} {} {}", symbol, value, text)?;
    }
    Ok(())
}

pub(crate) struct Compact;

impl Compact {
    pub(crate) const fn new() -> Self {
        Self
    }
}

impl StatsFormatter for Compact {
    fn format(&self, stats: OutputStats) -> Result<String> {
        Ok(CompactStats { stats }.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{FailedTarget, FetchStats};
    use pretty_assertions::assert_eq;
    use novelgate_lib::cache::ArtifactCacheStats;
    use novelgate_lib::ratelimit::HostStatsMap;

    #[test]
    fn test_formatter() {
        console::set_colors_enabled(false);

        let stats = OutputStats {
            fetch: FetchStats {
                total: 3,
                successful: 2,
                errors: 1,
                failures: vec![FailedTarget {
                    pass: 1,
                    target: "chapter 3".to_string(),
                    url: "https://novels.test/3".to_string(),
                    error: "https://novels.test/3 responded with 404 Not Found".to_string(),
                }],
                ..FetchStats::default()
            },
            caches: ArtifactCacheStats {
                chapters: CacheStats {
                    entries: 2,
                    capacity: 100,
                    hits: 3,
                    misses: 1,
                    ..CacheStats::default()
                },
                ..ArtifactCacheStats::default()
            },
            hosts: HostStatsMap::default(),
        };

        let output = Compact::new().format(stats).unwrap();

        assert!(output.contains("Could not fetch 1 target."));
        assert!(output.contains("[chapter 3] pass 1"));
        assert!(output.contains("404 Not Found"));
        assert!(output.contains("🔍 3 Total (in 0s) ✅ 2 OK 🚫 1 Error"));
        assert!(!output.contains("Cancelled"));
        assert!(output.contains("chapters"));
        assert!(output.contains("75% hit ratio"));
        assert_eq!(output.matches("hit ratio").count(), 1);
        assert!(!output.contains("Per-host"));
    }
}
