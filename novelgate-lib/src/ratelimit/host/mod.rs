mod key;
mod stats;

pub use key::HostKey;
pub use stats::{HostStats, HostStatsMap};
