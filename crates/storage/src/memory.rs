//! MemoryStore: in-process sorted engine
//!
//! Implements [`SortedStore`] using:
//! - `BTreeMap<Vec<u8>, Vec<u8>>` for ordered raw-key storage
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Scans copy**: `scan` collects the bounded rows under the read lock
//!   and releases it before returning. The copy is the snapshot; callers
//!   may iterate it lazily or drop it half way without holding any lock.
//! - **Atomic create-if-absent**: `put_if_absent` checks and inserts under
//!   one write lock acquisition.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use stratakv_core::{Row, ScanRange, SortedStore, StrataResult};

/// Ordered raw-key map shared by the bundled engines
pub(crate) type RawMap = BTreeMap<Vec<u8>, Vec<u8>>;

/// Collect the rows of `map` selected by `range`
///
/// Returns an empty vector for empty or inverted bounds instead of letting
/// `BTreeMap::range` panic.
pub(crate) fn scan_map(map: &RawMap, range: &ScanRange) -> Vec<Row> {
    if range.is_empty() {
        return Vec::new();
    }
    let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (
        as_slice_bound(&range.lower),
        as_slice_bound(&range.upper),
    );
    let iter = map.range::<[u8], _>(bounds);
    let limit = range.limit.unwrap_or(usize::MAX);
    let clone_row = |(k, v): (&Vec<u8>, &Vec<u8>)| (k.clone(), v.clone());
    if range.reverse {
        iter.rev().take(limit).map(clone_row).collect()
    } else {
        iter.take(limit).map(clone_row).collect()
    }
}

fn as_slice_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_slice()),
        Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// In-memory sorted engine
///
/// Thread-safe through `parking_lot::RwLock`. Contents are lost when the
/// last reference is dropped; see [`crate::FileStore`] for persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<RawMap>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl SortedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> StrataResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StrataResult<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn put_if_absent(&self, key: &[u8], value: &[u8]) -> StrataResult<bool> {
        let mut data = self.data.write();
        if data.contains_key(key) {
            return Ok(false);
        }
        data.insert(key.to_vec(), value.to_vec());
        Ok(true)
    }

    fn delete(&self, key: &[u8]) -> StrataResult<bool> {
        Ok(self.data.write().remove(key).is_some())
    }

    fn scan(&self, range: &ScanRange) -> StrataResult<Vec<Row>> {
        Ok(scan_map(&self.data.read(), range))
    }

    fn clear(&self) -> StrataResult<()> {
        self.data.write().clear();
        Ok(())
    }
}
