//! Store façade
//!
//! A [`Store`] is either synchronous or asynchronous, fixed when it is
//! opened. Calling code checks the mode with [`Store::mode`] (or matches the
//! variant) and then uses the matching surface:
//!
//! ```no_run
//! use stratakv_collections::{OrderedMap, Store};
//! use stratakv_core::StrataResult;
//!
//! fn run(store: &Store) -> StrataResult<()> {
//!     if let Some(store) = store.as_sync() {
//!         let users: OrderedMap<String, String> = store.open_map("users")?;
//!         users.set("alice", "admin")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Opening a collection is cheap and idempotent: handles are views over the
//! shared engine, and two handles opened under the same name see the same
//! data.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use stratakv_core::{
    AsyncSortedStore, CollectionKey, CollectionValue, SortedStore, StrataResult,
};
use stratakv_storage::{BlockingAdapter, FileStore, MemoryStore};

use crate::array::{AsyncIndexedArray, IndexedArray};
use crate::config::{StoreConfig, CONFIG_FILE_NAME};
use crate::map::{AsyncOrderedMap, OrderedMap};
use crate::multi_map::{AsyncMultiMap, MultiMap};
use crate::namespace::CollectionKind;

/// Whether a store's operations block or suspend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Operations run to completion on the calling thread
    Sync,
    /// Operations are `async fn`s
    Async,
}

impl AccessMode {
    /// Name used in `stratakv.toml`
    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::Sync => "sync",
            AccessMode::Async => "async",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_open(kind: CollectionKind, name: &str, mode: AccessMode) {
    debug!(target: "stratakv::collections", %kind, name, %mode, "Opened collection");
}

/// Collections over a synchronous engine
#[derive(Clone)]
pub struct SyncStore {
    engine: Arc<dyn SortedStore>,
}

impl fmt::Debug for SyncStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncStore").finish_non_exhaustive()
    }
}

impl SyncStore {
    /// Store over `engine`
    pub fn new(engine: impl SortedStore + 'static) -> Self {
        Self::from_arc(Arc::new(engine))
    }

    /// Store over an engine that is already shared
    pub fn from_arc(engine: Arc<dyn SortedStore>) -> Self {
        Self { engine }
    }

    /// Store over a fresh in-memory engine
    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// The underlying engine
    pub fn engine(&self) -> &Arc<dyn SortedStore> {
        &self.engine
    }

    /// Open (or create) the ordered map `name`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `name` is empty.
    pub fn open_map<K, V>(&self, name: &str) -> StrataResult<OrderedMap<K, V>>
    where
        K: CollectionKey + 'static,
        V: CollectionValue + 'static,
    {
        let map = OrderedMap::open(Arc::clone(&self.engine), name)?;
        log_open(CollectionKind::Map, name, AccessMode::Sync);
        Ok(map)
    }

    /// Open (or create) the multi-map `name`
    pub fn open_multi_map<K, V>(&self, name: &str) -> StrataResult<MultiMap<K, V>>
    where
        K: CollectionKey + 'static,
        V: CollectionValue + 'static,
    {
        let map = MultiMap::open(Arc::clone(&self.engine), name)?;
        log_open(CollectionKind::MultiMap, name, AccessMode::Sync);
        Ok(map)
    }

    /// Open (or create) the array `name`
    pub fn open_array<V>(&self, name: &str) -> StrataResult<IndexedArray<V>>
    where
        V: CollectionValue + 'static,
    {
        let array = IndexedArray::open(Arc::clone(&self.engine), name)?;
        log_open(CollectionKind::Array, name, AccessMode::Sync);
        Ok(array)
    }

    /// Remove every collection
    ///
    /// Handles opened earlier stay usable. The next write to a cleared
    /// collection, through any handle, records its key shape afresh.
    pub fn clear(&self) -> StrataResult<()> {
        self.engine.clear()
    }
}

/// Collections over an asynchronous engine
#[derive(Clone)]
pub struct AsyncStore {
    engine: Arc<dyn AsyncSortedStore>,
}

impl fmt::Debug for AsyncStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncStore").finish_non_exhaustive()
    }
}

impl AsyncStore {
    /// Store over `engine`
    pub fn new(engine: impl AsyncSortedStore + 'static) -> Self {
        Self::from_arc(Arc::new(engine))
    }

    /// Store over an engine that is already shared
    pub fn from_arc(engine: Arc<dyn AsyncSortedStore>) -> Self {
        Self { engine }
    }

    /// Store over a fresh in-memory engine, run on the blocking pool
    pub fn memory() -> Self {
        Self::new(BlockingAdapter::new(MemoryStore::new()))
    }

    /// The underlying engine
    pub fn engine(&self) -> &Arc<dyn AsyncSortedStore> {
        &self.engine
    }

    /// Open (or create) the ordered map `name`
    pub fn open_map<K, V>(&self, name: &str) -> StrataResult<AsyncOrderedMap<K, V>>
    where
        K: CollectionKey + Send + 'static,
        V: CollectionValue + Send + 'static,
    {
        let map = AsyncOrderedMap::open(Arc::clone(&self.engine), name)?;
        log_open(CollectionKind::Map, name, AccessMode::Async);
        Ok(map)
    }

    /// Open (or create) the multi-map `name`
    pub fn open_multi_map<K, V>(&self, name: &str) -> StrataResult<AsyncMultiMap<K, V>>
    where
        K: CollectionKey + Send + 'static,
        V: CollectionValue + Send + 'static,
    {
        let map = AsyncMultiMap::open(Arc::clone(&self.engine), name)?;
        log_open(CollectionKind::MultiMap, name, AccessMode::Async);
        Ok(map)
    }

    /// Open (or create) the array `name`
    pub fn open_array<V>(&self, name: &str) -> StrataResult<AsyncIndexedArray<V>>
    where
        V: CollectionValue + Send + 'static,
    {
        let array = AsyncIndexedArray::open(Arc::clone(&self.engine), name)?;
        log_open(CollectionKind::Array, name, AccessMode::Async);
        Ok(array)
    }

    /// Remove every collection
    ///
    /// See [`SyncStore::clear`].
    pub async fn clear(&self) -> StrataResult<()> {
        self.engine.clear().await
    }
}

/// A synchronous or asynchronous store
#[derive(Debug, Clone)]
pub enum Store {
    /// Blocking operations
    Sync(SyncStore),
    /// Suspending operations
    Async(AsyncStore),
}

impl Store {
    /// Open a durable store in `dir`, reading (or creating) `stratakv.toml`
    pub fn open(dir: impl AsRef<Path>) -> StrataResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE_NAME);
        StoreConfig::write_default_if_missing(&path)?;
        let config = StoreConfig::from_file(&path)?;
        Self::open_with_config(dir, config)
    }

    /// Open a durable store in `dir` with an explicit configuration
    ///
    /// The config file is not read or written.
    pub fn open_with_config(dir: impl AsRef<Path>, config: StoreConfig) -> StrataResult<Self> {
        let mode = config.access_mode()?;
        let durability = config.durability_mode()?;
        let engine = FileStore::open(dir.as_ref(), durability)?;
        info!(
            target: "stratakv::collections",
            dir = %dir.as_ref().display(),
            %mode,
            "Opened store"
        );
        Ok(match mode {
            AccessMode::Sync => Store::Sync(SyncStore::new(engine)),
            AccessMode::Async => Store::Async(AsyncStore::new(BlockingAdapter::new(engine))),
        })
    }

    /// In-memory store; contents are lost when the last handle drops
    pub fn ephemeral(mode: AccessMode) -> Self {
        match mode {
            AccessMode::Sync => Store::Sync(SyncStore::memory()),
            AccessMode::Async => Store::Async(AsyncStore::memory()),
        }
    }

    /// Access mode of this store
    pub fn mode(&self) -> AccessMode {
        match self {
            Store::Sync(_) => AccessMode::Sync,
            Store::Async(_) => AccessMode::Async,
        }
    }

    /// Whether operations are asynchronous
    pub fn is_async(&self) -> bool {
        self.mode() == AccessMode::Async
    }

    /// The synchronous surface, if this is a synchronous store
    pub fn as_sync(&self) -> Option<&SyncStore> {
        match self {
            Store::Sync(store) => Some(store),
            Store::Async(_) => None,
        }
    }

    /// The asynchronous surface, if this is an asynchronous store
    pub fn as_async(&self) -> Option<&AsyncStore> {
        match self {
            Store::Async(store) => Some(store),
            Store::Sync(_) => None,
        }
    }
}

impl From<SyncStore> for Store {
    fn from(store: SyncStore) -> Self {
        Store::Sync(store)
    }
}

impl From<AsyncStore> for Store {
    fn from(store: AsyncStore) -> Self {
        Store::Async(store)
    }
}
