//! Role normalization and the visibility checks built on it.

use std::collections::HashMap;

use tracing::debug;

use schoolhub_core::config::RolesConfig;
use schoolhub_entity::notification::Audience;
use schoolhub_entity::principal::{Principal, Role};

/// Legacy role strings still present in older tenants.
const BUILTIN_ALIASES: &[(&str, Role)] = &[("admin2", Role::Manager)];

/// Maps raw role strings to canonical roles and answers visibility
/// questions on the result.
///
/// Normalization is total: unknown input is returned as
/// [`Role::Unrecognized`] with its raw text, and every predicate treats it
/// as unprivileged.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    /// Lowercased alias → canonical role.
    aliases: HashMap<String, Role>,
}

impl RoleResolver {
    /// Creates a resolver with the built-in aliases plus any configured ones.
    ///
    /// Configured aliases pointing at a non-canonical role are ignored.
    pub fn new(config: &RolesConfig) -> Self {
        let mut aliases: HashMap<String, Role> = HashMap::new();
        for (alias, target) in &config.aliases {
            match Role::parse_canonical(target) {
                Some(role) => {
                    aliases.insert(alias.trim().to_lowercase(), role);
                }
                None => {
                    debug!(alias = %alias, target = %target, "Ignoring alias to unknown role");
                }
            }
        }
        for (alias, role) in BUILTIN_ALIASES {
            aliases.insert((*alias).to_string(), role.clone());
        }
        Self { aliases }
    }

    /// Normalize a raw role string.
    pub fn normalize(&self, raw: &str) -> Role {
        if let Some(role) = Role::parse_canonical(raw) {
            return role;
        }
        match self.aliases.get(&raw.trim().to_lowercase()) {
            Some(role) => role.clone(),
            None => Role::Unrecognized(raw.to_string()),
        }
    }

    /// Normalize an already-decoded role. Only unrecognized values can change.
    pub fn normalize_role(&self, role: Role) -> Role {
        match role {
            Role::Unrecognized(raw) => self.normalize(&raw),
            canonical => canonical,
        }
    }

    /// Return the principal with its role normalized.
    pub fn normalize_principal(&self, mut principal: Principal) -> Principal {
        principal.role = self.normalize_role(principal.role);
        principal
    }

    /// Admin or manager after normalization.
    pub fn is_privileged(&self, role: &Role) -> bool {
        match role {
            Role::Unrecognized(raw) => self.normalize(raw).is_privileged(),
            other => other.is_privileged(),
        }
    }

    /// Whether the role may observe presence data and the online roster.
    pub fn can_view_presence(&self, role: &Role) -> bool {
        self.is_privileged(role)
    }

    /// Whether the role may read the tenant's connection history.
    pub fn can_view_session_history(&self, role: &Role) -> bool {
        self.is_privileged(role)
    }

    /// Whether an event addressed to `audience` should reach `principal`.
    pub fn audience_includes(&self, audience: &Audience, principal: &Principal) -> bool {
        let role = self.normalize_role(principal.role.clone());
        audience.includes(principal.id, &role)
    }
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new(&RolesConfig::default())
    }
}
