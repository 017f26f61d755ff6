//! Platform paths for the simulator's configuration.

use ares_core::{AresError, Result};
use std::path::PathBuf;

/// Path resolution for ares.
///
/// ```text
/// <config_dir>/ares/       # e.g. ~/.config/ares on Linux
/// └── config.toml          # Application configuration
/// ```
pub struct AresPaths;

impl AresPaths {
    const APP_DIR: &'static str = "ares";
    const CONFIG_FILE: &'static str = "config.toml";

    /// Returns the ares configuration directory.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the platform config directory cannot be
    /// determined.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or_else(|| AresError::config("cannot determine the platform config directory"))
    }

    /// Returns the path to the default configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(Self::CONFIG_FILE))
    }
}
