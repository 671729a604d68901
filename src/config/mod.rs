//! Configuration management for comicbox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use comicbox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `COMICBOX__<section>__<key>`
//!
//! Examples:
//! - `COMICBOX__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `COMICBOX__TASKS__NUM_WORKERS=8`
//! - `COMICBOX__STORAGE__PROVIDER=memory`
//!
//! The manage secret is environment-only: `COMICBOX_MANAGE_SECRET=...`.
//! Leaving it unset disables the /manage access guard.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/comicbox.toml`.
//! This can be overridden using the `COMICBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

// Re-export public types
pub use models::{Config, ServerConfig, SiteConfig, StorageConfig, StorageProvider, TaskConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`COMICBOX__*`)
    /// 2. TOML file (default: `config/comicbox.toml`)
    /// 3. Default values
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation
    /// fails (zero workers, zero page size, empty site base urls).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[tasks]
num_workers = 2

[sites.bilibili]
base_url = "http://127.0.0.1:4000"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.tasks.num_workers, 2);
        assert_eq!(config.sites.len(), 1);
    }

    #[test]
    fn test_validation_catches_zero_page_size() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[tasks]
page_size = 0
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidPageSize)
        ));
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:8080"
data_path = "data/tasks"

[tasks]
num_workers = 8
channel_size = 50
page_size = 20

[storage]
provider = "local"
root = "data/downloads"

[sites.bilibili]
base_url = "https://manga.bilibili.com"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.tasks.num_workers, 8);
        assert_eq!(config.tasks.channel_size, 50);
        assert_eq!(config.storage.provider, StorageProvider::Local);
        assert_eq!(
            config.sites["bilibili"].base_url.as_deref(),
            Some("https://manga.bilibili.com")
        );
    }
}
