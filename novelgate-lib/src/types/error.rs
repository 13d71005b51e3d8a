use thiserror::Error;

use crate::ratelimit::HostKey;

/// Possible errors when configuring or using `novelgate_lib`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An URL with an invalid host was found
    #[error("URL is missing a host")]
    InvalidUrlHost,

    /// A cache was configured to hold no entries at all
    #[error("Capacity of the {kind} cache must be at least 1")]
    ZeroCapacity {
        /// Name of the cache that was misconfigured
        kind: &'static str,
    },
}

/// The caller gave up waiting for a host before the gate admitted it.
///
/// The operation that was waiting for admission has not been invoked.
/// Retrying later is always safe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Admission to host {host} was cancelled")]
pub struct AdmissionCancelled {
    /// The host that was being waited for
    pub host: HostKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ErrorKind::ZeroCapacity { kind: "chapter" }.to_string(),
            "Capacity of the chapter cache must be at least 1"
        );
        let cancelled = AdmissionCancelled {
            host: HostKey::from("Example.com"),
        };
        assert_eq!(
            cancelled.to_string(),
            "Admission to host example.com was cancelled"
        );
    }
}
