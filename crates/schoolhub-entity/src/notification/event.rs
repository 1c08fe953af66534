//! Live feed event (a freshly composed message).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use schoolhub_core::types::id::{EventId, PrincipalId, TenantId};

use super::audience::Audience;
use crate::principal::Role;

/// An event as delivered by the live message feed. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Event id (also the document id).
    pub id: EventId,
    /// Tenant the message was posted in.
    pub tenant_id: TenantId,
    /// Author principal.
    pub author_id: PrincipalId,
    /// Author display name.
    #[serde(default)]
    pub author_name: String,
    /// Author role at posting time.
    pub author_role: Role,
    /// Message text.
    pub body: String,
    /// Addressing rule.
    pub audience: Audience,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Collection holding feed events.
    pub const COLLECTION: &'static str = "messages";
}
