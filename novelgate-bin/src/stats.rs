use serde::Serialize;

use crate::executor::FetchFailure;
use crate::target::Target;

/// A target that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct FailedTarget {
    pub(crate) pass: usize,
    pub(crate) target: String,
    pub(crate) url: String,
    pub(crate) error: String,
}

/// Outcome of all fetches in one run
#[derive(Debug, Default, Clone, Serialize)]
pub(crate) struct FetchStats {
    pub(crate) total: usize,
    pub(crate) successful: usize,
    pub(crate) errors: usize,
    pub(crate) cancelled: usize,
    pub(crate) retries: u64,
    /// Payload bytes handed back to the caller, cached or not
    pub(crate) bytes: usize,
    pub(crate) duration_secs: u64,
    pub(crate) failures: Vec<FailedTarget>,
}

impl FetchStats {
    pub(crate) fn add(
        &mut self,
        pass: usize,
        target: &Target,
        retries: u64,
        result: &Result<usize, FetchFailure>,
    ) {
        self.total += 1;
        self.retries += retries;

        match result {
            Ok(len) => {
                self.successful += 1;
                self.bytes += len;
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.cancelled += 1;
                } else {
                    self.errors += 1;
                }
                self.failures.push(FailedTarget {
                    pass,
                    target: target.key.to_string(),
                    url: target.url.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Whether every target was fetched
    pub(crate) const fn is_success(&self) -> bool {
        self.errors == 0 && self.cancelled == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use novelgate_lib::ArtifactKind;
    use novelgate_lib::AdmissionCancelled;
    use novelgate_lib::ratelimit::HostKey;
    use pretty_assertions::assert_eq;

    fn target() -> Target {
        Target::parse(ArtifactKind::Chapter, 1, "https://novels.test/1").unwrap()
    }

    #[test]
    fn test_add_results() {
        let mut stats = FetchStats::default();
        stats.add(1, &target(), 0, &Ok(10));
        stats.add(2, &target(), 1, &Ok(10));
        assert!(stats.is_success());

        let cancelled = FetchFailure::from(AdmissionCancelled {
            host: HostKey::from("novels.test"),
        });
        stats.add(2, &target(), 0, &Err(cancelled));

        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.cancelled, 1);
        assert_eq!(stats.errors, 0);
        assert_eq!(stats.retries, 1);
        assert_eq!(stats.bytes, 20);
        assert!(!stats.is_success());
        assert_eq!(
            stats.failures,
            vec![FailedTarget {
                pass: 2,
                target: "chapter 1".to_string(),
                url: "https://novels.test/1".to_string(),
                error: "Admission to host novels.test was cancelled".to_string(),
            }]
        );
    }
}
