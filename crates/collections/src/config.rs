//! Store configuration via `stratakv.toml`
//!
//! A durable store keeps its settings in a config file inside the data
//! directory. The first open writes a commented default; edit the file and
//! reopen to change settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use stratakv_core::{StrataError, StrataResult};
use stratakv_storage::{DurabilityMode, DEFAULT_SYNC_BATCH_SIZE};

use crate::store::AccessMode;

/// Config file name placed in the data directory
pub const CONFIG_FILE_NAME: &str = "stratakv.toml";

/// Store configuration loaded from `stratakv.toml`
///
/// # Example
///
/// ```toml
/// mode = "async"
/// durability = "always"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Access mode: `"sync"` or `"async"`
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Durability mode: `"standard"` or `"always"`
    #[serde(default = "default_durability")]
    pub durability: String,
    /// Writes between fsyncs in standard durability
    #[serde(default = "default_sync_batch_size")]
    pub sync_batch_size: usize,
}

fn default_mode() -> String {
    "sync".to_string()
}

fn default_durability() -> String {
    "standard".to_string()
}

fn default_sync_batch_size() -> usize {
    DEFAULT_SYNC_BATCH_SIZE
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            durability: default_durability(),
            sync_batch_size: default_sync_batch_size(),
        }
    }
}

impl StoreConfig {
    /// Default configuration with the given access mode
    pub fn with_mode(mode: AccessMode) -> Self {
        Self {
            mode: mode.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Parse the access mode
    ///
    /// # Errors
    ///
    /// Returns `Config` if the value is not `"sync"` or `"async"`.
    pub fn access_mode(&self) -> StrataResult<AccessMode> {
        match self.mode.as_str() {
            "sync" => Ok(AccessMode::Sync),
            "async" => Ok(AccessMode::Async),
            other => Err(StrataError::config(format!(
                "invalid mode '{}' in {}, expected \"sync\" or \"async\"",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Parse the durability mode
    ///
    /// # Errors
    ///
    /// Returns `Config` if the value is not `"standard"` or `"always"`, or
    /// the batch size is zero.
    pub fn durability_mode(&self) -> StrataResult<DurabilityMode> {
        match self.durability.as_str() {
            "always" => Ok(DurabilityMode::Always),
            "standard" if self.sync_batch_size == 0 => Err(StrataError::config(format!(
                "sync_batch_size in {} must be at least 1",
                CONFIG_FILE_NAME
            ))),
            "standard" => Ok(DurabilityMode::Standard {
                batch_size: self.sync_batch_size,
            }),
            other => Err(StrataError::config(format!(
                "invalid durability '{}' in {}, expected \"standard\" or \"always\"",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Check every field
    pub fn validate(&self) -> StrataResult<()> {
        self.access_mode()?;
        self.durability_mode()?;
        Ok(())
    }

    /// Default config file content, with comments
    pub fn default_toml() -> &'static str {
        r#"# stratakv store configuration
#
# Access mode: "sync" (default) or "async"
#   "sync"  = collection operations block the calling thread
#   "async" = collection operations are async fns, run on tokio
mode = "sync"

# Durability mode: "standard" (default) or "always"
#   "standard" = fsync every sync_batch_size writes
#   "always"   = fsync every write
durability = "standard"

# Writes between fsyncs in standard mode
sync_batch_size = 64
"#
    }

    /// Read and validate a config file
    pub fn from_file(path: &Path) -> StrataResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StrataError::config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            StrataError::config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file unless one exists
    pub fn write_default_if_missing(path: &Path) -> StrataResult<()> {
        if path.exists() {
            return Ok(());
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| {
            StrataError::config(format!(
                "failed to write default config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Serialize to TOML and write to `path`
    pub fn write_to_file(&self, path: &Path) -> StrataResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StrataError::config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StrataError::config(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
