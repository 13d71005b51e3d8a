use dashmap::DashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use super::backoff::Backoff;
use super::config::GateConfig;
use super::host::{HostKey, HostStats, HostStatsMap};
use crate::AdmissionCancelled;

/// Upper bound for server-requested cooldowns
const MAX_COOLDOWN: Duration = Duration::from_secs(3600);

/// Bookkeeping for a single host
#[derive(Debug, Default)]
struct HostSlot {
    /// When the last operation for this host was admitted.
    /// `None` while the host is unseen.
    last_served_at: Option<Instant>,

    /// No admission before this instant (`Retry-After`)
    cooldown_until: Option<Instant>,

    stats: HostStats,
}

impl HostSlot {
    fn is_eligible(&self, now: Instant, min_spacing: Duration) -> bool {
        if self.cooldown_until.is_some_and(|until| now < until) {
            return false;
        }
        self.last_served_at
            .is_none_or(|last| now.duration_since(last) >= min_spacing)
    }
}

/// Serializes and paces requests per remote host.
///
/// For every host, the starts of two admitted operations are at least
/// `min_spacing` apart. The first operation for a host that was never seen
/// before is admitted right away. Hosts never wait for each other.
///
/// Waiting callers do not queue up. Each sleeps for a randomized, slowly
/// growing interval (see [`Backoff`]) and then checks again, so the order in
/// which waiters for the same host get through is unspecified.
///
/// The gate only decides *when* an operation starts. It runs the operation
/// at most once, without holding any lock, and never retries it.
///
/// # Examples
///
/// ```
/// use novelgate_lib::ratelimit::{HostGate, HostKey};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let gate = HostGate::with_min_spacing(Duration::from_millis(10));
/// let host = HostKey::from("novels.example.com");
///
/// let first = gate.admit(&host, || async { 1 }).await;
/// let second = gate.admit(&host, || async { 2 }).await;
/// assert_eq!(first + second, 3);
/// assert_eq!(gate.host_stats(&host).admissions, 2);
/// # }
/// ```
#[derive(Debug)]
pub struct HostGate {
    hosts: DashMap<HostKey, HostSlot>,
    min_spacing: Duration,
}

impl HostGate {
    /// Create a gate from the given configuration
    #[must_use]
    pub fn new(config: GateConfig) -> Self {
        Self::with_min_spacing(config.request_interval)
    }

    /// Create a gate with the given minimum spacing between two requests to
    /// the same host
    #[must_use]
    pub fn with_min_spacing(min_spacing: Duration) -> Self {
        Self {
            hosts: DashMap::new(),
            min_spacing,
        }
    }

    /// Minimum spacing between two admissions for the same host
    #[must_use]
    pub const fn min_spacing(&self) -> Duration {
        self.min_spacing
    }

    /// Wait until `host` may be contacted, then run `operation`.
    ///
    /// There is no timeout; use [`HostGate::admit_until`] or
    /// [`HostGate::admit_before`] to bound the wait.
    pub async fn admit<F, Fut>(&self, host: &HostKey, operation: F) -> Fut::Output
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.wait_for_turn(host).await;
        operation().await
    }

    /// Like [`HostGate::admit`], but give up waiting once `cancel` completes.
    ///
    /// A caller that is admitted right away is not cancelled, even if `cancel`
    /// has already completed.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionCancelled`] if `cancel` completed first.
    /// `operation` is not invoked in that case.
    pub async fn admit_until<C, F, Fut>(
        &self,
        host: &HostKey,
        cancel: C,
        operation: F,
    ) -> Result<Fut::Output, AdmissionCancelled>
    where
        C: Future<Output = ()>,
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        tokio::select! {
            biased;
            () = self.wait_for_turn(host) => Ok(operation().await),
            () = cancel => {
                log::debug!("Gave up waiting for admission to host {host}");
                Err(AdmissionCancelled { host: host.clone() })
            }
        }
    }

    /// Like [`HostGate::admit`], but give up waiting at `deadline`.
    ///
    /// # Errors
    ///
    /// Returns [`AdmissionCancelled`] if the host did not become eligible
    /// before `deadline`. `operation` is not invoked in that case.
    pub async fn admit_before<F, Fut>(
        &self,
        host: &HostKey,
        deadline: Instant,
        operation: F,
    ) -> Result<Fut::Output, AdmissionCancelled>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        self.admit_until(host, tokio::time::sleep_until(deadline), operation)
            .await
    }

    /// Refuse admissions for `host` during the next `delay`.
    ///
    /// Used when a server answers with `Retry-After`. An already pending,
    /// longer cooldown is kept. Delays are capped at one hour.
    pub fn cool_down(&self, host: &HostKey, delay: Duration) {
        if delay > MAX_COOLDOWN {
            log::debug!(
                "Host {host}: capping Retry-After of {}s to {}s",
                delay.as_secs(),
                MAX_COOLDOWN.as_secs()
            );
        }
        let delay = delay.min(MAX_COOLDOWN);
        let until = Instant::now() + delay;

        let mut slot = self.hosts.entry(host.clone()).or_default();
        slot.cooldown_until = Some(
            slot.cooldown_until
                .map_or(until, |current| current.max(until)),
        );
        slot.stats.record_cooldown();

        log::debug!(
            "Host {host} asked to retry after {}ms, pausing admissions",
            delay.as_millis()
        );
    }

    /// Get statistics for a specific host.
    ///
    /// Hosts that were never seen report empty statistics.
    #[must_use]
    pub fn host_stats(&self, host: &HostKey) -> HostStats {
        self.hosts
            .get(host)
            .map(|slot| slot.stats.clone())
            .unwrap_or_default()
    }

    /// Get statistics for all hosts the gate has seen
    #[must_use]
    pub fn all_host_stats(&self) -> HostStatsMap {
        self.hosts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats.clone()))
            .collect::<std::collections::HashMap<_, _>>()
            .into()
    }

    /// Number of distinct hosts the gate has seen
    #[must_use]
    pub fn known_host_count(&self) -> usize {
        self.hosts.len()
    }

    async fn wait_for_turn(&self, host: &HostKey) {
        let started = Instant::now();
        let mut backoff = Backoff::new(self.min_spacing);

        while !self.try_claim(host, started) {
            let delay = backoff.next_delay();
            if backoff.attempts() == 1 {
                log::debug!("Host {host} is throttled, waiting for admission");
            }
            log::trace!(
                "Host {host}: attempt {} refused, rechecking in {}ms",
                backoff.attempts(),
                delay.as_millis()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Admit `host` if it is eligible right now.
    ///
    /// The check and the update happen under the same map guard, which is
    /// released before returning.
    fn try_claim(&self, host: &HostKey, started: Instant) -> bool {
        let now = Instant::now();
        let mut slot = self.hosts.entry(host.clone()).or_default();
        if !slot.is_eligible(now, self.min_spacing) {
            return false;
        }

        slot.last_served_at = Some(now);
        slot.cooldown_until = None;
        slot.stats.record_admission(now.duration_since(started));
        log::trace!("Host {host} admitted");
        true
    }
}

impl Default for HostGate {
    fn default() -> Self {
        Self::new(GateConfig::default())
    }
}
