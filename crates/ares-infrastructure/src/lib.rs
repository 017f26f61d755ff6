//! Infrastructure layer: configuration files, environment overrides and
//! platform paths.

pub mod config;
pub mod config_service;
pub mod paths;

pub use config::AresConfig;
pub use config_service::ConfigService;
pub use paths::AresPaths;
