//! Engine configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a serde default, so an empty file (or no
//! file at all) yields a working configuration.

pub mod logging;
pub mod notification;
pub mod presence;
pub mod roles;

use serde::{Deserialize, Serialize};

pub use self::logging::LoggingConfig;
pub use self::notification::{FeedConfig, NotificationConfig};
pub use self::presence::PresenceConfig;
pub use self::roles::RolesConfig;

use crate::error::AppError;

/// Root engine configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Heartbeat and online-window settings.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Live toast feed settings.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Persisted notification settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Role alias settings.
    #[serde(default)]
    pub roles: RolesConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `SCHOOLHUB`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SCHOOLHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an inline TOML string.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
