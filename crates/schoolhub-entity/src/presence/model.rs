//! Presence sample value object.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use schoolhub_core::types::id::{PrincipalId, TenantId};

use crate::principal::{Principal, Role};

/// The last heartbeat reported by a principal.
///
/// Online status is deliberately absent: it is derived from `last_seen_at`
/// at read time, so a principal that vanishes without signing out drops
/// offline on its own once the window elapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSample {
    /// Principal the sample describes (also the document id).
    pub principal_id: PrincipalId,
    /// Tenant of the principal.
    pub tenant_id: TenantId,
    /// Display name, so a roster renders without a profile lookup.
    #[serde(default)]
    pub display_name: String,
    /// Role at heartbeat time.
    pub role: Role,
    /// Last heartbeat timestamp.
    pub last_seen_at: DateTime<Utc>,
}

impl PresenceSample {
    /// Collection holding presence samples, keyed by principal id.
    pub const COLLECTION: &'static str = "presence";

    /// Build a fresh sample for `principal` at `now`.
    pub fn beat(principal: &Principal, now: DateTime<Utc>) -> Self {
        Self {
            principal_id: principal.id,
            tenant_id: principal.tenant_id,
            display_name: principal.display_name.clone(),
            role: principal.role.clone(),
            last_seen_at: now,
        }
    }

    /// Whether the principal counts as online at `now`.
    pub fn is_online(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now - self.last_seen_at < window
    }
}
