//! OrderedMap: sorted key → value collection
//!
//! ## Design
//!
//! Each logical key is one physical row `prefix ++ enc(key)`, so iteration
//! order is key order and range bounds translate directly into engine
//! bounds (see [`crate::namespace`]). The first write records the key
//! shape; later keys of another shape are rejected.
//!
//! [`OrderedMap`] runs against a synchronous engine and [`AsyncOrderedMap`]
//! against an asynchronous one. Both have the same operations with the same
//! semantics.

use std::borrow::Borrow;
use std::marker::PhantomData;
use std::sync::Arc;

use stratakv_core::{
    AsyncSortedStore, CollectionKey, CollectionValue, FromKey, FromValue, Key, Range, Row,
    SortedStore, StrataResult, ToKey, ToValue,
};

use crate::cursor::{scan_stream, Cursor, CursorStream};
use crate::namespace::{CollectionKind, Namespace};
use crate::shape::{check_read, check_read_async, check_write, check_write_async, ShapeGuard};

/// Keys of a range's bounds, for shape checking
pub(crate) fn bound_keys<K: ToKey>(range: &Range<K>) -> Vec<Key> {
    range
        .start
        .iter()
        .chain(range.end.iter())
        .map(ToKey::to_key)
        .collect()
}

pub(crate) fn decode_entry<K: FromKey, V: FromValue>(
    ns: &Namespace,
    (raw_key, raw_value): Row,
) -> StrataResult<(K, V)> {
    let key = K::from_key(ns.logical(&raw_key)?)?;
    Ok((key, V::from_value(raw_value)?))
}

fn key_cursor<K: FromKey + 'static>(ns: Namespace, rows: Vec<Row>) -> Cursor<K> {
    Cursor::new(rows, None, move |(raw_key, _)| {
        Some(ns.logical(&raw_key).and_then(K::from_key))
    })
}

fn value_cursor<V: FromValue + 'static>(rows: Vec<Row>) -> Cursor<V> {
    Cursor::new(rows, None, |(_, raw_value)| Some(V::from_value(raw_value)))
}

fn entry_cursor<K: FromKey + 'static, V: FromValue + 'static>(
    ns: Namespace,
    rows: Vec<Row>,
) -> Cursor<(K, V)> {
    Cursor::new(rows, None, move |row| Some(decode_entry(&ns, row)))
}

/// Named sorted map over a synchronous engine
pub struct OrderedMap<K, V> {
    engine: Arc<dyn SortedStore>,
    ns: Namespace,
    shape: ShapeGuard,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for OrderedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            ns: self.ns.clone(),
            shape: self.shape.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, V> std::fmt::Debug for OrderedMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderedMap")
            .field("name", &self.ns.name())
            .finish()
    }
}

impl<K, V> OrderedMap<K, V>
where
    K: CollectionKey + 'static,
    V: CollectionValue + 'static,
{
    pub(crate) fn open(engine: Arc<dyn SortedStore>, name: &str) -> StrataResult<Self> {
        Ok(Self {
            engine,
            ns: Namespace::new(CollectionKind::Map, name)?,
            shape: ShapeGuard::new(),
            _types: PhantomData,
        })
    }

    /// Name of the map
    pub fn name(&self) -> &str {
        self.ns.name()
    }

    fn read_key<Q: ToKey + ?Sized>(&self, key: &Q) -> StrataResult<Vec<u8>> {
        let key = key.to_key();
        check_read(self.engine.as_ref(), &self.ns, &self.shape, &key)?;
        Ok(self.ns.physical(&key))
    }

    fn write_key<Q: ToKey + ?Sized>(&self, key: &Q) -> StrataResult<Vec<u8>> {
        let key = key.to_key();
        check_write(self.engine.as_ref(), &self.ns, &self.shape, &key)?;
        Ok(self.ns.physical(&key))
    }

    fn scan(&self, range: &Range<K>) -> StrataResult<Vec<Row>> {
        for key in bound_keys(range) {
            check_read(self.engine.as_ref(), &self.ns, &self.shape, &key)?;
        }
        let scan = self.ns.scan_for(range, ToKey::to_key, range.limit);
        self.engine.scan(&scan)
    }

    /// Value stored under `key`
    pub fn get<Q>(&self, key: &Q) -> StrataResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let raw = self.read_key(key)?;
        self.engine.get(&raw)?.map(V::from_value).transpose()
    }

    /// Whether `key` holds a value
    pub fn has<Q>(&self, key: &Q) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let raw = self.read_key(key)?;
        Ok(self.engine.get(&raw)?.is_some())
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set<Q, W>(&self, key: &Q, value: &W) -> StrataResult<()>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let raw = self.write_key(key)?;
        self.engine.put(&raw, &value.to_value()?)
    }

    /// Store `value` only if `key` holds nothing
    ///
    /// Returns `true` if the value was written. Atomic against concurrent
    /// writers of the same engine.
    pub fn set_if_not_exists<Q, W>(&self, key: &Q, value: &W) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let raw = self.write_key(key)?;
        self.engine.put_if_absent(&raw, &value.to_value()?)
    }

    /// Remove `key`; returns whether it held a value
    pub fn delete<Q>(&self, key: &Q) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let raw = self.read_key(key)?;
        self.engine.delete(&raw)
    }

    /// Number of keys
    pub fn size(&self) -> StrataResult<usize> {
        Ok(self.engine.scan(&self.ns.scan_all())?.len())
    }

    /// Keys in `range`, in key order (or reverse)
    pub fn keys(&self, range: Range<K>) -> StrataResult<Cursor<K>> {
        Ok(key_cursor(self.ns.clone(), self.scan(&range)?))
    }

    /// Values in `range`, in key order (or reverse)
    pub fn values(&self, range: Range<K>) -> StrataResult<Cursor<V>> {
        Ok(value_cursor(self.scan(&range)?))
    }

    /// Key/value pairs in `range`, in key order (or reverse)
    pub fn entries(&self, range: Range<K>) -> StrataResult<Cursor<(K, V)>> {
        Ok(entry_cursor(self.ns.clone(), self.scan(&range)?))
    }
}

/// Named sorted map over an asynchronous engine
pub struct AsyncOrderedMap<K, V> {
    engine: Arc<dyn AsyncSortedStore>,
    ns: Namespace,
    shape: ShapeGuard,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for AsyncOrderedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            ns: self.ns.clone(),
            shape: self.shape.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, V> std::fmt::Debug for AsyncOrderedMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncOrderedMap")
            .field("name", &self.ns.name())
            .finish()
    }
}

impl<K, V> AsyncOrderedMap<K, V>
where
    K: CollectionKey + Send + 'static,
    V: CollectionValue + Send + 'static,
{
    pub(crate) fn open(engine: Arc<dyn AsyncSortedStore>, name: &str) -> StrataResult<Self> {
        Ok(Self {
            engine,
            ns: Namespace::new(CollectionKind::Map, name)?,
            shape: ShapeGuard::new(),
            _types: PhantomData,
        })
    }

    /// Name of the map
    pub fn name(&self) -> &str {
        self.ns.name()
    }

    async fn read_key(&self, key: Key) -> StrataResult<Vec<u8>> {
        check_read_async(self.engine.as_ref(), &self.ns, &self.shape, &key).await?;
        Ok(self.ns.physical(&key))
    }

    async fn write_key(&self, key: Key) -> StrataResult<Vec<u8>> {
        check_write_async(self.engine.as_ref(), &self.ns, &self.shape, &key).await?;
        Ok(self.ns.physical(&key))
    }

    async fn stream<T, F>(&self, range: Range<K>, make_cursor: F) -> StrataResult<CursorStream<T>>
    where
        T: Send + 'static,
        F: Fn(Vec<Row>) -> Cursor<T> + Send + 'static,
    {
        for key in bound_keys(&range) {
            check_read_async(self.engine.as_ref(), &self.ns, &self.shape, &key).await?;
        }
        let scan = self.ns.scan_for(&range, ToKey::to_key, range.limit);
        Ok(scan_stream(Arc::clone(&self.engine), scan, make_cursor))
    }

    /// Value stored under `key`
    pub async fn get<Q>(&self, key: &Q) -> StrataResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let raw = self.read_key(key.to_key()).await?;
        self.engine.get(&raw).await?.map(V::from_value).transpose()
    }

    /// Whether `key` holds a value
    pub async fn has<Q>(&self, key: &Q) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let raw = self.read_key(key.to_key()).await?;
        Ok(self.engine.get(&raw).await?.is_some())
    }

    /// Store `value` under `key`, replacing any previous value
    pub async fn set<Q, W>(&self, key: &Q, value: &W) -> StrataResult<()>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let value = value.to_value()?;
        let raw = self.write_key(key.to_key()).await?;
        self.engine.put(&raw, &value).await
    }

    /// Store `value` only if `key` holds nothing; returns `true` if written
    pub async fn set_if_not_exists<Q, W>(&self, key: &Q, value: &W) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let value = value.to_value()?;
        let raw = self.write_key(key.to_key()).await?;
        self.engine.put_if_absent(&raw, &value).await
    }

    /// Remove `key`; returns whether it held a value
    pub async fn delete<Q>(&self, key: &Q) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let raw = self.read_key(key.to_key()).await?;
        self.engine.delete(&raw).await
    }

    /// Number of keys
    pub async fn size(&self) -> StrataResult<usize> {
        Ok(self.engine.scan(&self.ns.scan_all()).await?.len())
    }

    /// Keys in `range`; the scan runs on first poll
    pub async fn keys(&self, range: Range<K>) -> StrataResult<CursorStream<K>> {
        let ns = self.ns.clone();
        self.stream(range, move |rows| key_cursor(ns.clone(), rows))
            .await
    }

    /// Values in `range`; the scan runs on first poll
    pub async fn values(&self, range: Range<K>) -> StrataResult<CursorStream<V>> {
        self.stream(range, value_cursor::<V>).await
    }

    /// Key/value pairs in `range`; the scan runs on first poll
    pub async fn entries(&self, range: Range<K>) -> StrataResult<CursorStream<(K, V)>> {
        let ns = self.ns.clone();
        self.stream(range, move |rows| entry_cursor(ns.clone(), rows))
            .await
    }
}
