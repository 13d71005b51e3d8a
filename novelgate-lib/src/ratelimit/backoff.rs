use rand::Rng;
use std::time::Duration;

/// Attempts after which the growing part of the wait stops growing
const MAX_GROWTH_ATTEMPTS: u32 = 10;

/// Added to every wait, once per attempt so far
const GROWTH_STEP: Duration = Duration::from_millis(100);

/// Wait schedule of a caller that was refused admission.
///
/// Every wait is `spacing / uniform(1..=10) + min(attempt, 10) * 100ms`.
/// The random divisor keeps concurrent waiters on the same host from waking
/// up in lockstep; the growing floor makes long waiters poll less often.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    spacing: Duration,
    attempt: u32,
}

impl Backoff {
    pub(crate) const fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            attempt: 0,
        }
    }

    /// Number of waits handed out so far
    pub(crate) const fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Next interval to sleep before rechecking
    pub(crate) fn next_delay(&mut self) -> Duration {
        let divisor = rand::rng().random_range(1..=10u32);
        self.next_delay_with(divisor)
    }

    fn next_delay_with(&mut self, divisor: u32) -> Duration {
        self.attempt = self.attempt.saturating_add(1);
        let growth = GROWTH_STEP * self.attempt.min(MAX_GROWTH_ATTEMPTS);
        self.spacing / divisor.max(1) + growth
    }
}
