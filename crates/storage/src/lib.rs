//! Storage engines for stratakv
//!
//! This crate implements the bundled sorted engines:
//! - MemoryStore: BTreeMap-based in-process engine with RwLock
//! - FileStore: MemoryStore index plus a CRC-checked operation log,
//!   replayed on open and compactable
//! - BlockingAdapter: exposes any synchronous engine as an asynchronous one
//!   by running calls on tokio's blocking pool
//!
//! Other engines plug in by implementing `SortedStore` or
//! `AsyncSortedStore` from `stratakv-core`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blocking;
pub mod durability;
pub mod file;
pub mod log;
pub mod memory;

pub use blocking::BlockingAdapter;
pub use durability::{DurabilityMode, DEFAULT_SYNC_BATCH_SIZE};
pub use file::{FileStore, LOG_FILE_NAME};
pub use memory::MemoryStore;
