//! Principal role enumeration.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Roles available to a school principal.
///
/// Stored role strings are decoded leniently: an input that is not one of
/// the canonical names survives as [`Role::Unrecognized`] with the raw
/// text preserved, instead of failing the whole document. Legacy aliases
/// are resolved later by the role resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// School owner account with full control.
    Admin,
    /// Delegated administrator.
    Manager,
    /// Teaching staff.
    Teacher,
    /// Enrolled pupil.
    Student,
    /// Parent or legal guardian.
    Guardian,
    /// A role string that matched no canonical name. Kept verbatim.
    Unrecognized(String),
}

impl Role {
    /// Match a canonical role name (case-insensitive, trimmed).
    pub fn parse_canonical(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "manager" => Some(Self::Manager),
            "teacher" => Some(Self::Teacher),
            "student" => Some(Self::Student),
            "guardian" => Some(Self::Guardian),
            _ => None,
        }
    }

    /// Decode a stored role string without failing.
    pub fn from_raw(raw: &str) -> Self {
        Self::parse_canonical(raw).unwrap_or_else(|| Self::Unrecognized(raw.to_string()))
    }

    /// Whether this is one of the five canonical roles.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    /// Admin or manager. Always false for an unrecognized role.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager)
    }

    /// Return the role as stored. Unrecognized roles return their raw text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Teacher => "teacher",
            Self::Student => "student",
            Self::Guardian => "guardian",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_raw(&raw))
    }
}
