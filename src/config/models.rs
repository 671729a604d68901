use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sites: HashMap<String, SiteConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Task ledger location (fjall keyspace).
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    /// Shared secret gating the /manage endpoints. Loaded from the
    /// environment only, never from TOML; unset disables the guard.
    #[serde(skip)]
    pub manage_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_path: default_data_path(),
            manage_secret: None,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/tasks")
}

/// Task orchestration configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskConfig {
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    /// Bound of each worker's task channel (backpressure).
    #[serde(default = "default_channel_size")]
    pub channel_size: usize,
    /// Fixed page size served by GET /manage/task/list.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            channel_size: default_channel_size(),
            page_size: default_page_size(),
        }
    }
}

fn default_num_workers() -> usize {
    4
}

fn default_channel_size() -> usize {
    100
}

fn default_page_size() -> usize {
    20
}

/// Artifact storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    Local,
    Memory,
}

impl Default for StorageProvider {
    fn default() -> Self {
        StorageProvider::Local
    }
}

/// Artifact storage configuration (downloaded pages, rendered PDFs)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub provider: StorageProvider,
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: StorageProvider::default(),
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/downloads")
}

/// Per-site overrides
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Override the provider's upstream base url.
    pub base_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.tasks.num_workers, 4);
        assert_eq!(config.tasks.page_size, 20);
        assert!(config.server.manage_secret.is_none());
        assert_eq!(config.storage.provider, StorageProvider::Local);
    }
}
