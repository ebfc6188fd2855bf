//! Wait timing configuration
//!
//! Defines how long and how often an operation is polled. Stored under the
//! `[wait]` table of the config file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing for operation waits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitSettings {
    /// Seconds to sleep before the first status check
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,

    /// Smallest gap between status checks, in seconds
    #[serde(default = "default_min_timeout_secs")]
    pub min_timeout_secs: u64,

    /// Give up after this many seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fixed gap between status checks, disabling backoff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,

    /// Consecutive "no such object" checks tolerated
    #[serde(default = "default_not_found_checks")]
    pub not_found_checks: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            min_timeout_secs: default_min_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            poll_interval_secs: None,
            not_found_checks: default_not_found_checks(),
        }
    }
}

impl WaitSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    pub fn min_timeout(&self) -> Duration {
        Duration::from_secs(self.min_timeout_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Option<Duration> {
        self.poll_interval_secs.map(Duration::from_secs)
    }
}

// Default value functions for serde
fn default_delay_secs() -> u64 {
    10
}

fn default_min_timeout_secs() -> u64 {
    2
}

fn default_timeout_secs() -> u64 {
    4 * 60
}

fn default_not_found_checks() -> u32 {
    20
}
