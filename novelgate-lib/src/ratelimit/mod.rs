//! Per-host admission control for outgoing requests.
//!
//! A [`HostGate`] decides when an operation for a given host may start.
//! Two operations for the same host start at least
//! [`GateConfig::request_interval`] apart, while different hosts are fully
//! independent. Servers can pause a host further with `Retry-After`, see
//! [`HostGate::cool_down`] and [`retry_after`].

mod backoff;
mod config;
mod gate;
mod headers;
mod host;

pub use config::{DEFAULT_REQUEST_INTERVAL, GateConfig};
pub use gate::HostGate;
pub use headers::{RetryAfterParseError, parse_retry_after, retry_after};
pub use host::{HostKey, HostStats, HostStatsMap};
