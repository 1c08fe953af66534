//! Role alias configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Extra legacy role aliases on top of the built-in table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RolesConfig {
    /// Legacy label → canonical role name.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}
