//! Principal entity model.

use serde::{Deserialize, Serialize};

use schoolhub_core::types::id::{PrincipalId, TenantId};

use super::role::Role;

/// An authenticated user identity with a role and tenant affiliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Principal id (also the profile document id).
    pub id: PrincipalId,
    /// Login email.
    pub email: String,
    /// Role, canonical once it has passed through the role resolver.
    pub role: Role,
    /// Whether the account may sign in.
    #[serde(default = "default_active")]
    pub active: bool,
    /// The school this principal belongs to.
    pub tenant_id: TenantId,
    /// Human-readable display name.
    pub display_name: String,
}

impl Principal {
    /// Collection holding principal profiles.
    pub const COLLECTION: &'static str = "principals";

    /// Check if this principal has admin or manager privileges.
    pub fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}

/// The identity handed over by the external authentication provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthIdentity {
    /// Provider-assigned principal id.
    pub id: PrincipalId,
    /// Verified email.
    pub email: String,
    /// Display name supplied by the provider, if any.
    pub display_name: Option<String>,
}

impl AuthIdentity {
    /// Display name to use when provisioning a profile: the provider's
    /// name, or the local part of the email.
    pub fn fallback_display_name(&self) -> String {
        match self.display_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

fn default_active() -> bool {
    true
}
