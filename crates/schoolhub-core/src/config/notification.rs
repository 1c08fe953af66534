//! Live feed and persisted notification configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Toast feed settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Maximum toasts kept in the display queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// How long a toast stays fully visible, in milliseconds.
    #[serde(default = "default_toast_display")]
    pub toast_display_ms: u64,
    /// Length of the exit animation after display ends, in milliseconds.
    #[serde(default = "default_toast_exit")]
    pub toast_exit_ms: u64,
    /// Number of most recent events the live query asks for.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// How often expired toasts are pruned, in milliseconds.
    #[serde(default = "default_prune_interval")]
    pub prune_interval_ms: u64,
}

impl FeedConfig {
    /// Visible phase length.
    pub fn display(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.toast_display_ms as i64)
    }

    /// Exit animation length.
    pub fn exit(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.toast_exit_ms as i64)
    }

    /// Prune tick.
    pub fn prune_interval(&self) -> Duration {
        Duration::from_millis(self.prune_interval_ms.max(1))
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            toast_display_ms: default_toast_display(),
            toast_exit_ms: default_toast_exit(),
            recent_window: default_recent_window(),
            prune_interval_ms: default_prune_interval(),
        }
    }
}

/// Persisted (inbox) notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Seconds between fallback polls of the inbox.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Window size for the compact (dropdown) view.
    #[serde(default = "default_compact_limit")]
    pub compact_limit: usize,
    /// Window size for the full list view.
    #[serde(default = "default_full_limit")]
    pub full_limit: usize,
}

impl NotificationConfig {
    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            compact_limit: default_compact_limit(),
            full_limit: default_full_limit(),
        }
    }
}

fn default_queue_capacity() -> usize {
    5
}

fn default_toast_display() -> u64 {
    6000
}

fn default_toast_exit() -> u64 {
    400
}

fn default_recent_window() -> usize {
    20
}

fn default_prune_interval() -> u64 {
    250
}

fn default_poll_interval() -> u64 {
    60
}

fn default_compact_limit() -> usize {
    20
}

fn default_full_limit() -> usize {
    100
}
