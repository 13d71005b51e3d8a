use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use super::key::HostKey;

/// A [`HashMap`] mapping hosts to their [`HostStats`]
#[derive(Debug, Default, Clone, Serialize)]
pub struct HostStatsMap(HashMap<HostKey, HostStats>);

impl HostStatsMap {
    /// Sort host statistics by admission count (descending order),
    /// ties broken by hostname
    #[must_use]
    pub fn sorted(&self) -> Vec<(HostKey, HostStats)> {
        let mut sorted_hosts: Vec<_> = self.0.clone().into_iter().collect();
        sorted_hosts.sort_by(|(a_key, a), (b_key, b)| {
            b.admissions.cmp(&a.admissions).then_with(|| a_key.cmp(b_key))
        });
        sorted_hosts
    }

    /// Statistics of a single host, if it was ever seen
    #[must_use]
    pub fn get(&self, host: &HostKey) -> Option<&HostStats> {
        self.0.get(host)
    }

    /// Number of hosts with statistics
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no host has been seen yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<HashMap<HostKey, HostStats>> for HostStatsMap {
    fn from(value: HashMap<HostKey, HostStats>) -> Self {
        Self(value)
    }
}

/// Record and report admission statistics for a single host
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostStats {
    /// Number of operations admitted for this host
    pub admissions: u64,
    /// Number of server-requested cooldowns (`Retry-After`)
    pub cooldowns: u64,
    /// Accumulated time callers spent waiting for admission
    #[serde(with = "humantime_serde")]
    pub total_wait: Duration,
    /// Longest single wait for admission
    #[serde(with = "humantime_serde")]
    pub max_wait: Duration,
    /// When the last operation was admitted
    #[serde(skip)]
    pub last_admitted: Option<Instant>,
}

impl HostStats {
    /// Record an admission after waiting for `waited`
    pub fn record_admission(&mut self, waited: Duration) {
        self.admissions += 1;
        self.total_wait += waited;
        self.max_wait = self.max_wait.max(waited);
        self.last_admitted = Some(Instant::now());
    }

    /// Record a cooldown requested by the server
    pub fn record_cooldown(&mut self) {
        self.cooldowns += 1;
    }

    /// Average time spent waiting per admission
    #[must_use]
    pub fn average_wait(&self) -> Option<Duration> {
        if self.admissions == 0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        Some(self.total_wait / self.admissions as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_admission() {
        let mut stats = HostStats::default();
        assert_eq!(stats.average_wait(), None);

        stats.record_admission(Duration::ZERO);
        stats.record_admission(Duration::from_millis(300));
        stats.record_admission(Duration::from_millis(900));

        assert_eq!(stats.admissions, 3);
        assert_eq!(stats.max_wait, Duration::from_millis(900));
        assert_eq!(stats.total_wait, Duration::from_millis(1200));
        assert_eq!(stats.average_wait(), Some(Duration::from_millis(400)));
        assert!(stats.last_admitted.is_some());
    }

    #[test]
    fn test_sorted_by_admissions() {
        let mut map = HashMap::new();
        for (host, admissions) in [("b.com", 1), ("a.com", 5), ("c.com", 1)] {
            map.insert(
                HostKey::from(host),
                HostStats {
                    admissions,
                    ..HostStats::default()
                },
            );
        }
        let hosts: Vec<String> = HostStatsMap::from(map)
            .sorted()
            .into_iter()
            .map(|(key, _)| key.into_string())
            .collect();
        assert_eq!(hosts, vec!["a.com", "b.com", "c.com"]);
    }

    #[test]
    fn test_serialize_durations_as_text() {
        let stats = HostStats {
            admissions: 2,
            total_wait: Duration::from_millis(1500),
            ..HostStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["admissions"], 2);
        assert_eq!(json["total_wait"], "1s 500ms");
        assert_eq!(json["max_wait"], "0s");
        assert!(json.get("last_admitted").is_none());
    }
}
