//! Error types for stratakv
//!
//! A single error enum is shared by the codec, the engines and the
//! collection layer. We use `thiserror` for automatic `Display` and `Error`
//! trait implementations.
//!
//! Absence is never an error: lookups of missing keys, out-of-range array
//! indices and pops on empty arrays return `None`/`false` instead.

use std::io;
use thiserror::Error;

/// Result type alias for stratakv operations
pub type StrataResult<T> = std::result::Result<T, StrataError>;

/// Error types for stratakv
#[derive(Debug, Error)]
pub enum StrataError {
    /// Caller supplied an argument the layer refuses to coerce
    ///
    /// Raised for key-shape mismatches, empty collection names and stored
    /// keys that do not decode into the handle's key type.
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the argument
        reason: String,
    },

    /// I/O error from a persistent engine
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Engine failure other than I/O
    #[error("Storage error: {0}")]
    Storage(String),

    /// Bytes read back from the engine are not a valid encoding
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Value serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The engine does not offer a capability the operation needs
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Configuration could not be read, parsed or validated
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StrataError {
    /// Create an `InvalidArgument` error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        StrataError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a `Storage` error
    pub fn storage(msg: impl Into<String>) -> Self {
        StrataError::Storage(msg.into())
    }

    /// Create a `Corruption` error
    pub fn corruption(msg: impl Into<String>) -> Self {
        StrataError::Corruption(msg.into())
    }

    /// Create a `Serialization` error
    pub fn serialization(msg: impl Into<String>) -> Self {
        StrataError::Serialization(msg.into())
    }

    /// Create an `Unsupported` error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        StrataError::Unsupported(msg.into())
    }

    /// Create a `Config` error
    pub fn config(msg: impl Into<String>) -> Self {
        StrataError::Config(msg.into())
    }

    /// Whether this error rejects a caller argument
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, StrataError::InvalidArgument { .. })
    }

    /// Whether this error originates in the engine (I/O, storage, corruption)
    pub fn is_engine_failure(&self) -> bool {
        matches!(
            self,
            StrataError::Io(_) | StrataError::Storage(_) | StrataError::Corruption(_)
        )
    }
}

impl From<rmp_serde::encode::Error> for StrataError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        StrataError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for StrataError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        StrataError::Serialization(e.to_string())
    }
}
