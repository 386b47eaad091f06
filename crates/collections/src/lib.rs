//! Typed collections over a sorted key-value engine
//!
//! This crate layers three collection kinds over any engine implementing
//! `SortedStore` or `AsyncSortedStore`:
//! - OrderedMap: one value per key, iterated in key order
//! - MultiMap: many values per key, kept in insertion order
//! - IndexedArray: integer-indexed sequence with tail push/pop
//!
//! Each kind comes in a blocking and a suspending form; the [`Store`] façade
//! hands out whichever matches its mode. Collections share one engine and
//! are isolated by a per-collection key prefix.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod config;
pub mod cursor;
pub mod map;
pub mod multi_map;
mod namespace;
mod shape;
pub mod store;

pub use array::{resolve_index, AsyncIndexedArray, IndexedArray};
pub use config::{StoreConfig, CONFIG_FILE_NAME};
pub use cursor::{Cursor, CursorStream};
pub use map::{AsyncOrderedMap, OrderedMap};
pub use multi_map::{AsyncMultiMap, MultiMap};
pub use namespace::CollectionKind;
pub use store::{AccessMode, AsyncStore, Store, SyncStore};
