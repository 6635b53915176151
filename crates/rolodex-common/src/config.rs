//! Global configuration model for the Rolodex assistant.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RolodexError};

/// Root configuration for the Rolodex assistant.
///
/// Every field has a default, so a configuration file only needs to name
/// the values it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RolodexConfig {
    /// Path of the address book file.
    pub data_file: PathBuf,
    /// Socket address bound by `rolodex serve`.
    pub listen: String,
    /// Look-ahead window of the `birthdays` command, in days.
    pub upcoming_days: u32,
}

impl Default for RolodexConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(crate::constants::DEFAULT_DATA_FILE),
            listen: crate::constants::DEFAULT_LISTEN_ADDR.to_string(),
            upcoming_days: crate::constants::DEFAULT_UPCOMING_DAYS,
        }
    }
}

impl RolodexConfig {
    /// Loads a configuration file, filling absent fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON
    /// for this model.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading configuration");
        let text = std::fs::read_to_string(path).map_err(|e| RolodexError::io(path, e))?;
        let config: Self = serde_json::from_str(&text).map_err(|e| RolodexError::Config {
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(config)
    }
}
