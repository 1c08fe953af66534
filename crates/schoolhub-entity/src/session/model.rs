//! Session (connection audit) entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolhub_core::types::id::{PrincipalId, SessionId, TenantId};

use super::device::{DeviceKind, GeoInfo};
use crate::principal::Role;

/// One authenticated connection's audit record.
///
/// Sessions are created when a principal signs in and closed exactly
/// once, at sign-out or when the next sign-in finds them dangling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier.
    pub id: SessionId,
    /// The principal this session belongs to.
    pub principal_id: PrincipalId,
    /// Tenant of the principal, for scoped history queries.
    pub tenant_id: TenantId,
    /// Display name at sign-in time.
    pub display_name: String,
    /// Role at sign-in time.
    pub role: Role,
    /// Device class.
    pub device: DeviceKind,
    /// Browser family.
    pub browser: String,
    /// Operating system family.
    #[serde(default)]
    pub os: String,
    /// Best-effort location.
    #[serde(default)]
    pub location: Option<GeoInfo>,
    /// When the session was opened.
    pub opened_at: DateTime<Utc>,
    /// When the session was closed, if it has been.
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Collection holding session records.
    pub const COLLECTION: &'static str = "sessions";

    /// Check whether the session is still open.
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Time between open and close, if closed.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.closed_at.map(|closed| closed - self.opened_at)
    }

    /// The timestamp to record when closing at `now`. Never earlier than
    /// `opened_at`, even under clock skew.
    pub fn close_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.max(self.opened_at)
    }
}

/// Data required to open a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    /// The principal this session belongs to.
    pub principal_id: PrincipalId,
    /// Tenant of the principal.
    pub tenant_id: TenantId,
    /// Display name.
    pub display_name: String,
    /// Role.
    pub role: Role,
    /// Device class.
    pub device: DeviceKind,
    /// Browser family.
    pub browser: String,
    /// Operating system family.
    pub os: String,
    /// Best-effort location.
    pub location: Option<GeoInfo>,
    /// Open timestamp.
    pub opened_at: DateTime<Utc>,
    /// Always `None` on creation; written explicitly so that an equality
    /// filter on `closedAt == null` finds open sessions.
    pub closed_at: Option<DateTime<Utc>>,
}
