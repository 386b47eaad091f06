//! stratakv - typed collections over embedded sorted key-value engines
//!
//! stratakv offers three collection kinds on top of any ordered byte-key
//! engine: ordered maps, multi-valued maps and integer-indexed arrays.
//! Keys may be text, integers, byte strings or tuples of those, and iterate
//! in their natural order.
//!
//! # Quick Start
//!
//! ```no_run
//! use stratakv::{AccessMode, OrderedMap, Range, Store};
//!
//! # fn main() -> stratakv::StrataResult<()> {
//! let store = Store::ephemeral(AccessMode::Sync);
//! let store = store.as_sync().expect("opened in sync mode");
//!
//! let scores: OrderedMap<(i64, String), String> = store.open_map("scores")?;
//! scores.set(&(5, "bar".to_string()), "second")?;
//! scores.set(&(0, "foo".to_string()), "first")?;
//!
//! for entry in scores.entries(Range::all())? {
//!     let ((rank, name), note) = entry?;
//!     println!("{rank} {name}: {note}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - `stratakv-core`: keys, the order-preserving key codec, value codecs and
//!   the engine traits
//! - `stratakv-storage`: the bundled in-memory and file-backed engines
//! - `stratakv-collections`: the collections and the [`Store`] façade

pub use stratakv_collections::*;
pub use stratakv_core::{
    decode_key, encode_key, AsyncSortedStore, CollectionKey, CollectionValue, FromKey,
    FromValue, Key, KeyKind, KeyPart, KeyShape, Msgpack, Range, Row, ScanRange, SortedStore,
    StrataError, StrataResult, ToKey, ToValue,
};
pub use stratakv_storage::{BlockingAdapter, DurabilityMode, FileStore, MemoryStore};
