//! Configuration for kvfile
//!
//! A store is described by the path of its data file and the fsync policy
//! of the log inside it. Configs can be built in code or parsed from the
//! JSON object form used by backend registries: `{"file": "/path/to/db"}`.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{KvError, Result};

/// Main configuration for a kvfile store
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Path of the single data file. `<file>.lock` sits next to it.
    #[serde(default)]
    pub file: PathBuf,

    /// How often the data file is fsynced for non-transactional writes
    #[serde(default)]
    pub sync_strategy: SyncStrategy,
}

/// Sync strategy for single-key writes
///
/// Batch commits are always synced before they are acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

impl Default for SyncStrategy {
    fn default() -> Self {
        SyncStrategy::EveryNEntries { count: 100 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("./kvfile.db"),
            sync_strategy: SyncStrategy::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a config from its JSON object form
    ///
    /// `file` is required; everything else falls back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)
            .map_err(|e| KvError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the config names a usable data file
    pub fn validate(&self) -> Result<()> {
        if self.file.as_os_str().is_empty() {
            return Err(KvError::Config("missing 'file' parameter".to_string()));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(KvError::Config(
                "syncStrategy.everyNEntries.count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data file path
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.file = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
