//! Engine traits for the underlying sorted store
//!
//! Collections never touch bytes on disk themselves. They delegate to an
//! engine implementing one of:
//!
//! - [`SortedStore`]: non-suspending, for in-process engines
//! - [`AsyncSortedStore`]: suspending, for engines whose I/O may block
//!
//! Both traits expose the same capability set: byte-key get/put/delete,
//! ordered range scans with explicit bounds, and an atomic
//! create-if-absent.
//!
//! ## put_if_absent
//!
//! `put_if_absent` MUST be atomic with respect to every other write to the
//! same key through the same engine. An engine that cannot guarantee this
//! must return [`StrataError::Unsupported`] instead of emulating it with a
//! get followed by a put.
//!
//! [`StrataError::Unsupported`]: crate::error::StrataError::Unsupported

use std::ops::Bound;

use async_trait::async_trait;

use crate::error::StrataResult;

/// A stored key/value pair as raw bytes
pub type Row = (Vec<u8>, Vec<u8>);

/// Physical scan request handed to an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRange {
    /// Lower bound on raw keys
    pub lower: Bound<Vec<u8>>,
    /// Upper bound on raw keys
    pub upper: Bound<Vec<u8>>,
    /// Return rows from the upper end downwards
    pub reverse: bool,
    /// Maximum rows to return
    pub limit: Option<usize>,
}

impl ScanRange {
    /// Scan over `[lower, upper)`
    pub fn new(lower: Vec<u8>, upper: Vec<u8>) -> Self {
        Self {
            lower: Bound::Included(lower),
            upper: Bound::Excluded(upper),
            reverse: false,
            limit: None,
        }
    }

    /// Scan every key that starts with `prefix`
    pub fn prefix(prefix: &[u8]) -> Self {
        Self {
            lower: Bound::Included(prefix.to_vec()),
            upper: match crate::codec::prefix_successor(prefix) {
                Some(end) => Bound::Excluded(end),
                None => Bound::Unbounded,
            },
            reverse: false,
            limit: None,
        }
    }

    /// Builder: descending order
    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Builder: result cap
    pub fn limited(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Whether no key can satisfy both bounds
    ///
    /// Engines check this before handing bounds to structures that panic on
    /// inverted ranges (e.g. `BTreeMap::range`).
    pub fn is_empty(&self) -> bool {
        if self.limit == Some(0) {
            return true;
        }
        let (lo, lo_inclusive) = match &self.lower {
            Bound::Included(k) => (k, true),
            Bound::Excluded(k) => (k, false),
            Bound::Unbounded => return false,
        };
        let (hi, hi_inclusive) = match &self.upper {
            Bound::Included(k) => (k, true),
            Bound::Excluded(k) => (k, false),
            Bound::Unbounded => return false,
        };
        lo > hi || (lo == hi && !(lo_inclusive && hi_inclusive))
    }

    /// Whether `key` lies within the bounds (ignores direction and limit)
    pub fn contains(&self, key: &[u8]) -> bool {
        let above = match &self.lower {
            Bound::Included(k) => key >= k.as_slice(),
            Bound::Excluded(k) => key > k.as_slice(),
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(k) => key <= k.as_slice(),
            Bound::Excluded(k) => key < k.as_slice(),
            Bound::Unbounded => true,
        };
        above && below
    }
}

/// Synchronous sorted key-value engine
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait SortedStore: Send + Sync {
    /// Get the value stored under `key`
    fn get(&self, key: &[u8]) -> StrataResult<Option<Vec<u8>>>;

    /// Insert or overwrite `key`
    fn put(&self, key: &[u8], value: &[u8]) -> StrataResult<()>;

    /// Atomically insert `key` iff absent; true iff it inserted
    fn put_if_absent(&self, key: &[u8], value: &[u8]) -> StrataResult<bool>;

    /// Remove `key`; returns whether it existed
    fn delete(&self, key: &[u8]) -> StrataResult<bool>;

    /// Rows within `range`, ordered by raw key (descending if reversed)
    ///
    /// The result is a consistent snapshot taken at call time.
    fn scan(&self, range: &ScanRange) -> StrataResult<Vec<Row>>;

    /// Remove every key
    fn clear(&self) -> StrataResult<()>;
}

/// Asynchronous sorted key-value engine
///
/// Same contract as [`SortedStore`], but every call may suspend.
#[async_trait]
pub trait AsyncSortedStore: Send + Sync {
    /// Get the value stored under `key`
    async fn get(&self, key: &[u8]) -> StrataResult<Option<Vec<u8>>>;

    /// Insert or overwrite `key`
    async fn put(&self, key: &[u8], value: &[u8]) -> StrataResult<()>;

    /// Atomically insert `key` iff absent; true iff it inserted
    async fn put_if_absent(&self, key: &[u8], value: &[u8]) -> StrataResult<bool>;

    /// Remove `key`; returns whether it existed
    async fn delete(&self, key: &[u8]) -> StrataResult<bool>;

    /// Rows within `range`, ordered by raw key (descending if reversed)
    async fn scan(&self, range: &ScanRange) -> StrataResult<Vec<Row>>;

    /// Remove every key
    async fn clear(&self) -> StrataResult<()>;
}
