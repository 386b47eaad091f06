//! Durability mode configuration
//!
//! Controls when the operation log is fsynced to disk.

/// Default number of writes between fsyncs in `Standard` mode
pub const DEFAULT_SYNC_BATCH_SIZE: usize = 64;

/// Durability mode for the operation log
///
/// | Mode     | fsync                 | Data Loss Window           |
/// |----------|-----------------------|----------------------------|
/// | Always   | Every write           | Zero                       |
/// | Standard | Every `batch_size`    | Up to `batch_size` writes  |
///
/// Both modes flush the userspace buffer on every write, so a process crash
/// (as opposed to an OS crash or power loss) loses nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurabilityMode {
    /// fsync after every write
    Always,
    /// fsync every `batch_size` writes (the default)
    Standard {
        /// Maximum writes between fsyncs
        batch_size: usize,
    },
}

impl DurabilityMode {
    /// Standard mode with the default batch size
    pub fn standard_default() -> Self {
        DurabilityMode::Standard {
            batch_size: DEFAULT_SYNC_BATCH_SIZE,
        }
    }

    /// Whether `writes_since_sync` pending writes require an fsync now
    pub fn should_sync(&self, writes_since_sync: usize) -> bool {
        match self {
            DurabilityMode::Always => true,
            DurabilityMode::Standard { batch_size } => writes_since_sync >= (*batch_size).max(1),
        }
    }

    /// Human-readable description of the mode
    pub fn description(&self) -> &'static str {
        match self {
            DurabilityMode::Always => "Always sync (safest, slowest)",
            DurabilityMode::Standard { .. } => "Standard (balanced speed/safety)",
        }
    }
}

impl Default for DurabilityMode {
    fn default() -> Self {
        Self::standard_default()
    }
}
