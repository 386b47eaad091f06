//! Core types and traits for stratakv
//!
//! This crate defines the foundational types used throughout the system:
//! - Key: logical composite key (text, integer and byte-string components)
//! - Codec: order-preserving byte encoding of keys
//! - Value: value conversion traits and the MessagePack wrapper
//! - Range: range options for collection iteration
//! - Error: error type hierarchy
//! - Traits: engine traits (SortedStore, AsyncSortedStore)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod key;
pub mod range;
pub mod traits;
pub mod value;

// Re-export commonly used types and traits
pub use codec::{decode_key, encode_key, prefix_successor, KEY_SENTINEL};
pub use error::{StrataError, StrataResult};
pub use key::{CollectionKey, FromKey, Key, KeyComponent, KeyKind, KeyPart, KeyShape, ToKey};
pub use range::Range;
pub use traits::{AsyncSortedStore, Row, ScanRange, SortedStore};
pub use value::{CollectionValue, FromValue, Msgpack, ToValue};
