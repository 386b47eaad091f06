//! Key-shape enforcement for maps and multi-maps
//!
//! The first write to a collection records the shape of its key in the
//! collection's metadata row (claimed with `put_if_absent`, so concurrent
//! first writers agree on one shape). Every later key must have the same
//! shape; a mismatch is an `InvalidArgument` error rather than a silent
//! coercion.
//!
//! Clearing the store removes metadata rows, after which the next writer
//! records a new shape. Writes therefore always consult the metadata row
//! (and re-claim it when it is gone), while reads trust the shape each
//! handle cached on its last lookup.

use parking_lot::RwLock;

use stratakv_core::{AsyncSortedStore, Key, KeyShape, SortedStore, StrataError, StrataResult};

use crate::namespace::Namespace;

/// Per-handle cache of a collection's recorded key shape
#[derive(Debug, Default)]
pub(crate) struct ShapeGuard {
    recorded: RwLock<Option<KeyShape>>,
}

impl Clone for ShapeGuard {
    fn clone(&self) -> Self {
        Self {
            recorded: RwLock::new(self.recorded.read().clone()),
        }
    }
}

impl ShapeGuard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Check against the cached shape; `None` when nothing is cached yet
    pub(crate) fn check_cached(&self, ns: &Namespace, key: &Key) -> Option<StrataResult<()>> {
        self.recorded
            .read()
            .as_ref()
            .map(|shape| compare(ns, shape, key))
    }

    /// Adopt a shape read from (or just written to) the metadata row and
    /// check `key` against it
    pub(crate) fn adopt(&self, ns: &Namespace, raw: &[u8], key: &Key) -> StrataResult<()> {
        let shape = KeyShape::from_bytes(raw)?;
        let checked = compare(ns, &shape, key);
        *self.recorded.write() = Some(shape);
        checked
    }
}

fn vanished(ns: &Namespace) -> StrataError {
    StrataError::storage(format!(
        "metadata of {} '{}' disappeared after create-if-absent was refused",
        ns.kind(),
        ns.name()
    ))
}

/// Check a key used for lookup or as a range bound
///
/// A collection with no recorded shape has never been written, so any key
/// is acceptable (and will simply find nothing).
pub(crate) fn check_read(
    engine: &dyn SortedStore,
    ns: &Namespace,
    guard: &ShapeGuard,
    key: &Key,
) -> StrataResult<()> {
    if let Some(checked) = guard.check_cached(ns, key) {
        return checked;
    }
    match engine.get(ns.meta_key())? {
        Some(raw) => guard.adopt(ns, &raw, key),
        None => Ok(()),
    }
}

/// Check a key about to be written, recording its shape if the collection
/// has none
pub(crate) fn check_write(
    engine: &dyn SortedStore,
    ns: &Namespace,
    guard: &ShapeGuard,
    key: &Key,
) -> StrataResult<()> {
    if let Some(raw) = engine.get(ns.meta_key())? {
        return guard.adopt(ns, &raw, key);
    }
    let proposed = key.shape().to_bytes();
    if engine.put_if_absent(ns.meta_key(), &proposed)? {
        return guard.adopt(ns, &proposed, key);
    }
    let raw = engine.get(ns.meta_key())?.ok_or_else(|| vanished(ns))?;
    guard.adopt(ns, &raw, key)
}

/// Asynchronous form of [`check_read`]
pub(crate) async fn check_read_async(
    engine: &dyn AsyncSortedStore,
    ns: &Namespace,
    guard: &ShapeGuard,
    key: &Key,
) -> StrataResult<()> {
    if let Some(checked) = guard.check_cached(ns, key) {
        return checked;
    }
    match engine.get(ns.meta_key()).await? {
        Some(raw) => guard.adopt(ns, &raw, key),
        None => Ok(()),
    }
}

/// Asynchronous form of [`check_write`]
pub(crate) async fn check_write_async(
    engine: &dyn AsyncSortedStore,
    ns: &Namespace,
    guard: &ShapeGuard,
    key: &Key,
) -> StrataResult<()> {
    if let Some(raw) = engine.get(ns.meta_key()).await? {
        return guard.adopt(ns, &raw, key);
    }
    let proposed = key.shape().to_bytes();
    if engine.put_if_absent(ns.meta_key(), &proposed).await? {
        return guard.adopt(ns, &proposed, key);
    }
    let raw = engine.get(ns.meta_key()).await?.ok_or_else(|| vanished(ns))?;
    guard.adopt(ns, &raw, key)
}

fn compare(ns: &Namespace, recorded: &KeyShape, key: &Key) -> StrataResult<()> {
    let actual = key.shape();
    if &actual == recorded {
        Ok(())
    } else {
        Err(StrataError::invalid_argument(format!(
            "key shape {} does not match shape {} of {} '{}'",
            actual,
            recorded,
            ns.kind(),
            ns.name()
        )))
    }
}
