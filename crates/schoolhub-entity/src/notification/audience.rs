//! Addressing rules for live feed events.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use schoolhub_core::types::id::PrincipalId;

use crate::principal::Role;

/// A named group of roles an event can be addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleClass {
    /// Teaching staff (`"profs"`).
    Teachers,
    /// Pupils (`"eleves"`).
    Students,
    /// Parents and guardians (`"parents"`).
    Guardians,
    /// Administration (`"staff"`): admins and managers.
    Staff,
}

impl RoleClass {
    /// Resolve a stored class label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "profs" => Some(Self::Teachers),
            "eleves" => Some(Self::Students),
            "parents" => Some(Self::Guardians),
            "staff" => Some(Self::Staff),
            _ => None,
        }
    }

    /// The stored label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Teachers => "profs",
            Self::Students => "eleves",
            Self::Guardians => "parents",
            Self::Staff => "staff",
        }
    }

    /// Whether a canonical role belongs to this class.
    pub fn includes(&self, role: &Role) -> bool {
        match self {
            Self::Teachers => matches!(role, Role::Teacher),
            Self::Students => matches!(role, Role::Student),
            Self::Guardians => matches!(role, Role::Guardian),
            Self::Staff => matches!(role, Role::Admin | Role::Manager),
        }
    }
}

/// Who an event is addressed to. Stored as a single string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Audience {
    /// Every principal of the tenant.
    Everyone,
    /// Exactly one principal.
    Principal(PrincipalId),
    /// Every principal whose role is in the class.
    RoleClass(RoleClass),
    /// A value that matched nothing. Addressed to nobody.
    Unrecognized(String),
}

impl Audience {
    /// Stored value for [`Audience::Everyone`].
    pub const EVERYONE: &'static str = "everyone";

    /// Decode a stored audience string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case(Self::EVERYONE) {
            return Self::Everyone;
        }
        if let Some(class) = RoleClass::from_label(trimmed) {
            return Self::RoleClass(class);
        }
        match trimmed.parse::<PrincipalId>() {
            Ok(id) => Self::Principal(id),
            Err(_) => Self::Unrecognized(raw.to_string()),
        }
    }

    /// Whether a principal with `principal_id` and canonical `role` is
    /// addressed by this audience.
    pub fn includes(&self, principal_id: PrincipalId, role: &Role) -> bool {
        match self {
            Self::Everyone => true,
            Self::Principal(id) => *id == principal_id,
            Self::RoleClass(class) => class.includes(role),
            Self::Unrecognized(_) => false,
        }
    }

    /// The stored string form.
    pub fn to_stored(&self) -> String {
        match self {
            Self::Everyone => Self::EVERYONE.to_string(),
            Self::Principal(id) => id.to_string(),
            Self::RoleClass(class) => class.label().to_string(),
            Self::Unrecognized(raw) => raw.clone(),
        }
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_stored())
    }
}

impl Serialize for Audience {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_stored())
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
