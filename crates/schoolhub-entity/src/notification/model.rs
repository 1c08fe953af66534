//! Persisted (inbox) notification entity model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolhub_core::types::id::{NotificationId, PrincipalId, TenantId};

/// Read state of a persisted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStatus {
    /// Not yet read.
    Unread,
    /// Read; never goes back to unread.
    Read,
}

impl ReadStatus {
    /// Return the status as stored.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Title and body of a persisted notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
}

/// A notification addressed to one recipient, stored by backend triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedNotification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient principal.
    pub recipient_id: PrincipalId,
    /// Tenant of the recipient.
    pub tenant_id: TenantId,
    /// Notification type, e.g. `"grade_published"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Title and message.
    pub payload: NotificationPayload,
    /// Read state.
    pub status: ReadStatus,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification was read. Set iff `status == Read`.
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

impl PersistedNotification {
    /// Collection holding persisted notifications.
    pub const COLLECTION: &'static str = "notifications";

    /// Check if the notification has not been read.
    pub fn is_unread(&self) -> bool {
        self.status == ReadStatus::Unread
    }

    /// Transition unread → read at `now`. Returns `false` (and changes
    /// nothing) if it was already read.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_unread() {
            return false;
        }
        self.status = ReadStatus::Read;
        self.read_at = Some(now);
        true
    }
}
