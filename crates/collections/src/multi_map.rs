//! MultiMap: sorted key → many values
//!
//! Every association is its own physical row keyed by
//! `prefix ++ enc(key) ++ enc(seq)`. The sequence number is one greater
//! than the key's current largest, so a key's values sort contiguously in
//! insertion order and a reverse scan with limit 1 finds the next number.
//! New rows are claimed with `put_if_absent`; an appender that loses a race
//! moves on to the following number instead of overwriting.

use std::borrow::Borrow;
use std::marker::PhantomData;
use std::sync::Arc;

use stratakv_core::{
    AsyncSortedStore, CollectionKey, CollectionValue, FromKey, FromValue, Key, Range, Row,
    ScanRange, SortedStore, StrataError, StrataResult, ToKey, ToValue,
};

use crate::cursor::{scan_stream, Cursor, CursorStream};
use crate::map::bound_keys;
use crate::namespace::{CollectionKind, Namespace};
use crate::shape::{check_read, check_read_async, check_write, check_write_async, ShapeGuard};

fn bump(ns: &Namespace, seq: i64) -> StrataResult<i64> {
    seq.checked_add(1).ok_or_else(|| {
        StrataError::storage(format!(
            "sequence numbers exhausted in {} '{}'",
            ns.kind(),
            ns.name()
        ))
    })
}

/// Sequence number following the newest row of a key
fn next_seq(ns: &Namespace, newest: Option<&Row>) -> StrataResult<i64> {
    match newest {
        None => Ok(0),
        Some((raw_key, _)) => bump(ns, ns.logical_seq(raw_key)?.1),
    }
}

fn newest_of(ns: &Namespace, key: &Key) -> ScanRange {
    ns.scan_key(key).reversed(true).limited(Some(1))
}

/// Oldest row of a key whose value is byte-equal to `value`
fn oldest_matching(rows: Vec<Row>, value: &[u8]) -> Option<Vec<u8>> {
    rows.into_iter()
        .find(|(_, stored)| stored.as_slice() == value)
        .map(|(raw_key, _)| raw_key)
}

fn distinct_key_cursor<K: FromKey + 'static>(
    ns: Namespace,
    rows: Vec<Row>,
    limit: Option<usize>,
) -> Cursor<K> {
    let mut last: Option<Key> = None;
    Cursor::new(rows, limit, move |(raw_key, _)| {
        let key = match ns.logical_seq(&raw_key) {
            Ok((key, _)) => key,
            Err(e) => return Some(Err(e)),
        };
        if last.as_ref() == Some(&key) {
            return None;
        }
        last = Some(key.clone());
        Some(K::from_key(key))
    })
}

fn value_cursor<V: FromValue + 'static>(rows: Vec<Row>) -> Cursor<V> {
    Cursor::new(rows, None, |(_, raw_value)| Some(V::from_value(raw_value)))
}

fn entry_cursor<K: FromKey + 'static, V: FromValue + 'static>(
    ns: Namespace,
    rows: Vec<Row>,
) -> Cursor<(K, V)> {
    Cursor::new(rows, None, move |(raw_key, raw_value)| {
        let decoded = ns
            .logical_seq(&raw_key)
            .and_then(|(key, _)| K::from_key(key))
            .and_then(|key| Ok((key, V::from_value(raw_value)?)));
        Some(decoded)
    })
}

fn decode_values<V: FromValue>(rows: Vec<Row>) -> StrataResult<Vec<V>> {
    rows.into_iter()
        .map(|(_, raw_value)| V::from_value(raw_value))
        .collect()
}

/// Named multi-valued map over a synchronous engine
pub struct MultiMap<K, V> {
    engine: Arc<dyn SortedStore>,
    ns: Namespace,
    shape: ShapeGuard,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for MultiMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            ns: self.ns.clone(),
            shape: self.shape.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, V> std::fmt::Debug for MultiMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiMap")
            .field("name", &self.ns.name())
            .finish()
    }
}

impl<K, V> MultiMap<K, V>
where
    K: CollectionKey + 'static,
    V: CollectionValue + 'static,
{
    pub(crate) fn open(engine: Arc<dyn SortedStore>, name: &str) -> StrataResult<Self> {
        Ok(Self {
            engine,
            ns: Namespace::new(CollectionKind::MultiMap, name)?,
            shape: ShapeGuard::new(),
            _types: PhantomData,
        })
    }

    /// Name of the multi-map
    pub fn name(&self) -> &str {
        self.ns.name()
    }

    fn read_key<Q: ToKey + ?Sized>(&self, key: &Q) -> StrataResult<Key> {
        let key = key.to_key();
        check_read(self.engine.as_ref(), &self.ns, &self.shape, &key)?;
        Ok(key)
    }

    fn write_key<Q: ToKey + ?Sized>(&self, key: &Q) -> StrataResult<Key> {
        let key = key.to_key();
        check_write(self.engine.as_ref(), &self.ns, &self.shape, &key)?;
        Ok(key)
    }

    fn scan(&self, range: &Range<K>, limit: Option<usize>) -> StrataResult<Vec<Row>> {
        for key in bound_keys(range) {
            check_read(self.engine.as_ref(), &self.ns, &self.shape, &key)?;
        }
        self.engine
            .scan(&self.ns.scan_for(range, ToKey::to_key, limit))
    }

    /// Oldest value associated with `key`
    pub fn get<Q>(&self, key: &Q) -> StrataResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.read_key(key)?;
        let scan = self.ns.scan_key(&key).limited(Some(1));
        match self.engine.scan(&scan)?.pop() {
            Some((_, raw_value)) => V::from_value(raw_value).map(Some),
            None => Ok(None),
        }
    }

    /// Every value associated with `key`, oldest first
    pub fn get_values<Q>(&self, key: &Q) -> StrataResult<Vec<V>>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.read_key(key)?;
        decode_values(self.engine.scan(&self.ns.scan_key(&key))?)
    }

    /// Whether `key` has any association
    pub fn has<Q>(&self, key: &Q) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.read_key(key)?;
        let scan = self.ns.scan_key(&key).limited(Some(1));
        Ok(!self.engine.scan(&scan)?.is_empty())
    }

    /// Append an association; duplicates are kept as separate entries
    pub fn set<Q, W>(&self, key: &Q, value: &W) -> StrataResult<()>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let key = self.write_key(key)?;
        let value = value.to_value()?;
        let newest = self.engine.scan(&newest_of(&self.ns, &key))?;
        let mut seq = next_seq(&self.ns, newest.first())?;
        loop {
            let raw = self.ns.physical_seq(&key, seq);
            if self.engine.put_if_absent(&raw, &value)? {
                return Ok(());
            }
            seq = bump(&self.ns, seq)?;
        }
    }

    /// Add the first association of `key`; returns `false` if it already
    /// has one
    pub fn set_if_not_exists<Q, W>(&self, key: &Q, value: &W) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let key = self.write_key(key)?;
        let value = value.to_value()?;
        let scan = self.ns.scan_key(&key).limited(Some(1));
        if !self.engine.scan(&scan)?.is_empty() {
            return Ok(false);
        }
        self.engine
            .put_if_absent(&self.ns.physical_seq(&key, 0), &value)
    }

    /// Remove the oldest association of `key` with `value`
    ///
    /// Returns whether one was removed.
    pub fn delete_value<Q, W>(&self, key: &Q, value: &W) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let key = self.read_key(key)?;
        let value = value.to_value()?;
        let rows = self.engine.scan(&self.ns.scan_key(&key))?;
        match oldest_matching(rows, &value) {
            Some(raw) => self.engine.delete(&raw),
            None => Ok(false),
        }
    }

    /// Remove every association of `key`; returns how many were removed
    pub fn delete<Q>(&self, key: &Q) -> StrataResult<usize>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.read_key(key)?;
        let mut removed = 0;
        for (raw, _) in self.engine.scan(&self.ns.scan_key(&key))? {
            if self.engine.delete(&raw)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Distinct keys in `range`; `limit` counts keys
    pub fn keys(&self, range: Range<K>) -> StrataResult<Cursor<K>> {
        let rows = self.scan(&range, None)?;
        Ok(distinct_key_cursor(self.ns.clone(), rows, range.limit))
    }

    /// Every associated value in `range`, by key then insertion order
    pub fn values(&self, range: Range<K>) -> StrataResult<Cursor<V>> {
        Ok(value_cursor(self.scan(&range, range.limit)?))
    }

    /// Every (key, value) association in `range`
    pub fn entries(&self, range: Range<K>) -> StrataResult<Cursor<(K, V)>> {
        Ok(entry_cursor(self.ns.clone(), self.scan(&range, range.limit)?))
    }
}

/// Named multi-valued map over an asynchronous engine
pub struct AsyncMultiMap<K, V> {
    engine: Arc<dyn AsyncSortedStore>,
    ns: Namespace,
    shape: ShapeGuard,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for AsyncMultiMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            ns: self.ns.clone(),
            shape: self.shape.clone(),
            _types: PhantomData,
        }
    }
}

impl<K, V> std::fmt::Debug for AsyncMultiMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncMultiMap")
            .field("name", &self.ns.name())
            .finish()
    }
}

impl<K, V> AsyncMultiMap<K, V>
where
    K: CollectionKey + Send + 'static,
    V: CollectionValue + Send + 'static,
{
    pub(crate) fn open(engine: Arc<dyn AsyncSortedStore>, name: &str) -> StrataResult<Self> {
        Ok(Self {
            engine,
            ns: Namespace::new(CollectionKind::MultiMap, name)?,
            shape: ShapeGuard::new(),
            _types: PhantomData,
        })
    }

    /// Name of the multi-map
    pub fn name(&self) -> &str {
        self.ns.name()
    }

    async fn read_key(&self, key: Key) -> StrataResult<Key> {
        check_read_async(self.engine.as_ref(), &self.ns, &self.shape, &key).await?;
        Ok(key)
    }

    async fn write_key(&self, key: Key) -> StrataResult<Key> {
        check_write_async(self.engine.as_ref(), &self.ns, &self.shape, &key).await?;
        Ok(key)
    }

    async fn stream<T, F>(
        &self,
        range: &Range<K>,
        limit: Option<usize>,
        make_cursor: F,
    ) -> StrataResult<CursorStream<T>>
    where
        T: Send + 'static,
        F: Fn(Vec<Row>) -> Cursor<T> + Send + 'static,
    {
        for key in bound_keys(range) {
            check_read_async(self.engine.as_ref(), &self.ns, &self.shape, &key).await?;
        }
        let scan = self.ns.scan_for(range, ToKey::to_key, limit);
        Ok(scan_stream(Arc::clone(&self.engine), scan, make_cursor))
    }

    /// Oldest value associated with `key`
    pub async fn get<Q>(&self, key: &Q) -> StrataResult<Option<V>>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.read_key(key.to_key()).await?;
        let scan = self.ns.scan_key(&key).limited(Some(1));
        match self.engine.scan(&scan).await?.pop() {
            Some((_, raw_value)) => V::from_value(raw_value).map(Some),
            None => Ok(None),
        }
    }

    /// Every value associated with `key`, oldest first
    pub async fn get_values<Q>(&self, key: &Q) -> StrataResult<Vec<V>>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.read_key(key.to_key()).await?;
        decode_values(self.engine.scan(&self.ns.scan_key(&key)).await?)
    }

    /// Whether `key` has any association
    pub async fn has<Q>(&self, key: &Q) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.read_key(key.to_key()).await?;
        let scan = self.ns.scan_key(&key).limited(Some(1));
        Ok(!self.engine.scan(&scan).await?.is_empty())
    }

    /// Append an association; duplicates are kept as separate entries
    pub async fn set<Q, W>(&self, key: &Q, value: &W) -> StrataResult<()>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let value = value.to_value()?;
        let key = self.write_key(key.to_key()).await?;
        let newest = self.engine.scan(&newest_of(&self.ns, &key)).await?;
        let mut seq = next_seq(&self.ns, newest.first())?;
        loop {
            let raw = self.ns.physical_seq(&key, seq);
            if self.engine.put_if_absent(&raw, &value).await? {
                return Ok(());
            }
            seq = bump(&self.ns, seq)?;
        }
    }

    /// Add the first association of `key`; returns `false` if it already
    /// has one
    pub async fn set_if_not_exists<Q, W>(&self, key: &Q, value: &W) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let value = value.to_value()?;
        let key = self.write_key(key.to_key()).await?;
        let scan = self.ns.scan_key(&key).limited(Some(1));
        if !self.engine.scan(&scan).await?.is_empty() {
            return Ok(false);
        }
        self.engine
            .put_if_absent(&self.ns.physical_seq(&key, 0), &value)
            .await
    }

    /// Remove the oldest association of `key` with `value`
    pub async fn delete_value<Q, W>(&self, key: &Q, value: &W) -> StrataResult<bool>
    where
        K: Borrow<Q>,
        V: Borrow<W>,
        Q: ToKey + ?Sized,
        W: ToValue + ?Sized,
    {
        let value = value.to_value()?;
        let key = self.read_key(key.to_key()).await?;
        let rows = self.engine.scan(&self.ns.scan_key(&key)).await?;
        match oldest_matching(rows, &value) {
            Some(raw) => self.engine.delete(&raw).await,
            None => Ok(false),
        }
    }

    /// Remove every association of `key`; returns how many were removed
    pub async fn delete<Q>(&self, key: &Q) -> StrataResult<usize>
    where
        K: Borrow<Q>,
        Q: ToKey + ?Sized,
    {
        let key = self.read_key(key.to_key()).await?;
        let mut removed = 0;
        for (raw, _) in self.engine.scan(&self.ns.scan_key(&key)).await? {
            if self.engine.delete(&raw).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Distinct keys in `range`; `limit` counts keys
    pub async fn keys(&self, range: Range<K>) -> StrataResult<CursorStream<K>> {
        let ns = self.ns.clone();
        let limit = range.limit;
        self.stream(&range, None, move |rows| {
            distinct_key_cursor(ns.clone(), rows, limit)
        })
        .await
    }

    /// Every associated value in `range`
    pub async fn values(&self, range: Range<K>) -> StrataResult<CursorStream<V>> {
        self.stream(&range, range.limit, value_cursor::<V>).await
    }

    /// Every (key, value) association in `range`
    pub async fn entries(&self, range: Range<K>) -> StrataResult<CursorStream<(K, V)>> {
        let ns = self.ns.clone();
        self.stream(&range, range.limit, move |rows| entry_cursor(ns.clone(), rows))
            .await
    }
}
