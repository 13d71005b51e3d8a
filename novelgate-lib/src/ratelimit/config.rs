use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default minimum interval between two requests to the same host
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration of the [`HostGate`](crate::ratelimit::HostGate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Minimum interval between requests to the same host
    #[serde(default = "default_request_interval", with = "humantime_serde")]
    pub request_interval: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            request_interval: default_request_interval(),
        }
    }
}

const fn default_request_interval() -> Duration {
    DEFAULT_REQUEST_INTERVAL
}

impl GateConfig {
    /// Create a `GateConfig` from CLI options, using defaults for missing values
    #[must_use]
    pub fn from_options(request_interval: Option<Duration>) -> Self {
        Self {
            request_interval: request_interval.unwrap_or(DEFAULT_REQUEST_INTERVAL),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gate_config() {
        assert_eq!(
            GateConfig::default().request_interval,
            Duration::from_secs(1)
        );
        assert_eq!(
            GateConfig::from_options(Some(Duration::from_millis(300))).request_interval,
            Duration::from_millis(300)
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = GateConfig {
            request_interval: Duration::from_millis(2500),
        };

        let toml = toml::to_string(&config).unwrap();
        assert_eq!(toml.trim(), "request_interval = \"2s 500ms\"");
        let deserialized: GateConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: GateConfig = toml::from_str("").unwrap();
        assert_eq!(config, GateConfig::default());
    }
}
