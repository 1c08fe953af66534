//! User-agent classification for session audit records.

use schoolhub_entity::session::{DeviceInfo, DeviceKind};

/// Derives coarse device metadata from a user-agent string.
///
/// Only the device class, browser family, and OS family are extracted.
/// Anything unrecognized becomes `"Unknown"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceFingerprint;

impl DeviceFingerprint {
    /// Classify a user agent. A missing or blank agent yields
    /// [`DeviceInfo::unknown`].
    pub fn from_user_agent(user_agent: Option<&str>) -> DeviceInfo {
        let ua = match user_agent.map(str::trim) {
            Some(ua) if !ua.is_empty() => ua,
            _ => return DeviceInfo::unknown(),
        };

        DeviceInfo {
            kind: device_kind(ua),
            browser: browser(ua).to_string(),
            os: os(ua).to_string(),
        }
    }
}

fn device_kind(ua: &str) -> DeviceKind {
    if ua.contains("iPad") || ua.contains("Tablet") || (ua.contains("Android") && !ua.contains("Mobile"))
    {
        DeviceKind::Tablet
    } else if ua.contains("Mobi") || ua.contains("iPhone") || ua.contains("Android") {
        DeviceKind::Mobile
    } else {
        DeviceKind::Desktop
    }
}

// Order matters: Edge and Opera also advertise Chrome, and Chrome
// advertises Safari.
fn browser(ua: &str) -> &'static str {
    if ua.contains("Edg/") || ua.contains("Edge/") {
        "Edge"
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        "Opera"
    } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
        "Chrome"
    } else if ua.contains("Firefox/") || ua.contains("FxiOS/") {
        "Firefox"
    } else if ua.contains("Safari/") {
        "Safari"
    } else {
        DeviceInfo::UNKNOWN
    }
}

fn os(ua: &str) -> &'static str {
    if ua.contains("Windows") {
        "Windows"
    } else if ua.contains("Android") {
        "Android"
    } else if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod") {
        "iOS"
    } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        "macOS"
    } else if ua.contains("CrOS") {
        "ChromeOS"
    } else if ua.contains("Linux") {
        "Linux"
    } else {
        DeviceInfo::UNKNOWN
    }
}
