//! Presence heartbeat configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Heartbeat cadence and the window used to derive online status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Seconds between two heartbeat writes for the signed-in principal.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// A principal is online while `now - lastSeenAt` is below this many seconds.
    #[serde(default = "default_online_window")]
    pub online_window_seconds: u64,
}

impl PresenceConfig {
    /// Heartbeat interval as a tokio-friendly duration.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds.max(1))
    }

    /// Online window as a chrono duration, for comparisons against timestamps.
    pub fn online_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.online_window_seconds as i64)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: default_heartbeat_interval(),
            online_window_seconds: default_online_window(),
        }
    }
}

fn default_heartbeat_interval() -> u64 {
    60
}

fn default_online_window() -> u64 {
    180
}
