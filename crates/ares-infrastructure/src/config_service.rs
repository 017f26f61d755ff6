//! Configuration loading.
//!
//! Resolution order for the file:
//!
//! 1. An explicit path (the CLI `--config` flag)
//! 2. `$ARES_CONFIG`
//! 3. `<config_dir>/ares/config.toml`, if it exists
//! 4. Built-in defaults
//!
//! Environment overrides are applied on top of whatever was loaded.

use crate::config::AresConfig;
use crate::paths::AresPaths;
use ares_core::{AresError, Result};
use ares_interaction::EngineKind;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG: &str = "ARES_CONFIG";
pub const ENV_ENGINE: &str = "ARES_ENGINE";
pub const ENV_LOCAL_URL: &str = "ARES_LOCAL_URL";
pub const ENV_LOCAL_MODEL: &str = "ARES_LOCAL_MODEL";
pub const ENV_ENDPOINT_URL: &str = "HF_ENDPOINT_URL";
pub const ENV_TOKEN: &str = "HF_TOKEN";
pub const ENV_TOKEN_ALT: &str = "HUGGINGFACE_API_TOKEN";
pub const ENV_MAX_MESSAGES: &str = "ARES_MAX_MESSAGES";

/// Loads and validates [`AresConfig`].
pub struct ConfigService;

impl ConfigService {
    /// Loads configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file is missing or unreadable,
    /// the TOML is malformed, an override has an invalid value, or the
    /// result fails validation.
    pub fn load(explicit: Option<&Path>) -> Result<AresConfig> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// Same as [`ConfigService::load`], reading variables through `lookup`.
    pub fn load_with<F>(explicit: Option<&Path>, lookup: F) -> Result<AresConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match Self::resolve_path(explicit, &lookup)? {
            Some(path) => {
                let config = Self::load_file(&path)?;
                tracing::info!(path = %path.display(), "Loaded configuration");
                config
            }
            None => {
                tracing::debug!("No configuration file found, using defaults");
                AresConfig::default()
            }
        };

        Self::apply_env_overrides(&mut config, &lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `Serialization` if it is
    /// not valid configuration TOML.
    pub fn load_file(path: &Path) -> Result<AresConfig> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Applies the supported environment variables to `config`.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `ARES_ENGINE` or `ARES_MAX_MESSAGES` cannot be
    /// parsed.
    pub fn apply_env_overrides<F>(config: &mut AresConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(engine) = var(ENV_ENGINE) {
            config.engine.kind = engine.parse::<EngineKind>().map_err(|_| {
                AresError::config(format!(
                    "{ENV_ENGINE}='{engine}' is not one of mock, local, remote"
                ))
            })?;
        }
        if let Some(url) = var(ENV_LOCAL_URL) {
            config.engine.local.base_url = url;
        }
        if let Some(model) = var(ENV_LOCAL_MODEL) {
            config.engine.local.model = model;
        }
        if let Some(url) = var(ENV_ENDPOINT_URL) {
            config.engine.remote.url = Some(url);
        }
        if let Some(token) = var(ENV_TOKEN).or_else(|| var(ENV_TOKEN_ALT)) {
            config.engine.remote.token = Some(token);
        }
        if let Some(max) = var(ENV_MAX_MESSAGES) {
            config.chat.max_messages = max.parse().map_err(|_| {
                AresError::config(format!("{ENV_MAX_MESSAGES}='{max}' is not a number"))
            })?;
        }
        Ok(())
    }

    fn resolve_path<F>(explicit: Option<&Path>, lookup: &F) -> Result<Option<PathBuf>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| lookup(ENV_CONFIG).filter(|v| !v.trim().is_empty()).map(PathBuf::from));

        if let Some(path) = named {
            if !path.is_file() {
                return Err(AresError::config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path));
        }

        // A missing platform directory just means there is no default file.
        Ok(AresPaths::config_file().ok().filter(|path| path.is_file()))
    }
}
