//! Device and location value objects attached to a session record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Desktop or laptop.
    #[default]
    Desktop,
    /// Phone.
    Mobile,
    /// Tablet.
    Tablet,
}

impl DeviceKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Tablet => "tablet",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Device metadata derived from the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device class.
    pub kind: DeviceKind,
    /// Browser family, e.g. `"Firefox"`.
    pub browser: String,
    /// Operating system family, e.g. `"Android"`.
    pub os: String,
}

impl DeviceInfo {
    /// Placeholder used when nothing could be derived.
    pub const UNKNOWN: &'static str = "Unknown";

    /// Device info with every field unknown.
    pub fn unknown() -> Self {
        Self {
            kind: DeviceKind::Desktop,
            browser: Self::UNKNOWN.to_string(),
            os: Self::UNKNOWN.to_string(),
        }
    }
}

/// Best-effort geographic location of the client.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeoInfo {
    /// City name.
    pub city: Option<String>,
    /// Region or state.
    pub region: Option<String>,
    /// Country name or code.
    pub country: Option<String>,
}

impl GeoInfo {
    /// Whether no part of the location is known.
    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.region.is_none() && self.country.is_none()
    }

    /// Short "City, Country" label, falling back to whichever parts exist.
    pub fn label(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.is_empty())
            .collect();
        match parts.as_slice() {
            [] => None,
            [only] => Some((*only).to_string()),
            [first, .., last] => Some(format!("{first}, {last}")),
        }
    }
}
