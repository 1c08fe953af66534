//! Toast display lifecycle.

use chrono::{DateTime, Duration, Utc};

use schoolhub_core::types::id::EventId;
use schoolhub_entity::notification::NotificationEvent;

/// Where a toast is in its display lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    /// On screen.
    Visible,
    /// Playing its exit animation.
    Leaving,
    /// Finished; due for pruning.
    Gone,
}

/// A surfaced feed event with its display deadlines.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// The event being shown.
    pub event: NotificationEvent,
    /// When the toast was surfaced.
    pub shown_at: DateTime<Utc>,
    /// When the exit animation starts.
    pub leave_at: DateTime<Utc>,
    /// When the toast is gone.
    pub gone_at: DateTime<Utc>,
}

impl Toast {
    pub(crate) fn new(
        event: NotificationEvent,
        now: DateTime<Utc>,
        display: Duration,
        exit: Duration,
    ) -> Self {
        let leave_at = now + display;
        Self {
            event,
            shown_at: now,
            leave_at,
            gone_at: leave_at + exit,
        }
    }

    /// Id of the underlying event.
    pub fn id(&self) -> EventId {
        self.event.id
    }

    /// Phase at `now`.
    pub fn phase(&self, now: DateTime<Utc>) -> ToastPhase {
        if now < self.leave_at {
            ToastPhase::Visible
        } else if now < self.gone_at {
            ToastPhase::Leaving
        } else {
            ToastPhase::Gone
        }
    }

    /// Start the exit animation now, unless it already started.
    pub(crate) fn dismiss(&mut self, now: DateTime<Utc>, exit: Duration) -> bool {
        if now >= self.leave_at {
            return false;
        }
        self.leave_at = now;
        self.gone_at = now + exit;
        true
    }
}
