//! IndexedArray: integer-addressed sequence
//!
//! Stored as a map from index to value plus a length counter:
//!
//! ```text
//! prefix ++ enc("length")  -> u64 big-endian
//! prefix ++ enc(i)         -> element i, for 0 <= i < length
//! ```
//!
//! Text keys sort before integer keys, so the counter never appears inside
//! an element scan. Only the tail moves: `push` writes the element before
//! raising the length and `pop` lowers the length before deleting the
//! element, so a reader never sees a length covering a missing element.
//!
//! Negative indexes count from the end (`-1` is the last element).

use std::marker::PhantomData;
use std::sync::Arc;

use stratakv_core::{
    AsyncSortedStore, CollectionValue, FromValue, Key, KeyPart, Row, ScanRange, SortedStore,
    StrataError, StrataResult, ToValue,
};

use crate::cursor::{scan_stream, Cursor, CursorStream};
use crate::namespace::{CollectionKind, Namespace};

const LENGTH_KEY: &str = "length";

/// Position of `index` in an array of `len` elements
///
/// Negative indexes resolve to `len + index`. Returns `None` when the
/// resolved position is outside `0..len`.
pub fn resolve_index(index: i64, len: u64) -> Option<u64> {
    if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        let index = index as u64;
        (index < len).then_some(index)
    }
}

/// Physical layout of one array
#[derive(Debug, Clone)]
struct Slots {
    ns: Namespace,
    length_key: Vec<u8>,
}

impl Slots {
    fn new(name: &str) -> StrataResult<Self> {
        let ns = Namespace::new(CollectionKind::Array, name)?;
        let length_key = ns.physical(&Key::single(LENGTH_KEY));
        Ok(Self { ns, length_key })
    }

    // Lengths are capped at i64::MAX by `grow`, so every index fits.
    fn slot(&self, index: u64) -> Vec<u8> {
        self.ns.physical(&Key::single(index as i64))
    }

    fn decode_length(raw: Option<Vec<u8>>) -> StrataResult<u64> {
        raw.map(u64::from_value).transpose().map(Option::unwrap_or_default)
    }

    fn grow(&self, len: u64) -> StrataResult<u64> {
        if len >= i64::MAX as u64 {
            return Err(StrataError::invalid_argument(format!(
                "array '{}' is full",
                self.ns.name()
            )));
        }
        Ok(len + 1)
    }

    fn missing(&self, index: u64, len: u64) -> StrataError {
        StrataError::corruption(format!(
            "array '{}' has length {} but no element at index {}",
            self.ns.name(),
            len,
            index
        ))
    }

    /// Outcome of a lookup that found no element at `index`
    ///
    /// `len` is re-read after the lookup: a concurrent pop may have moved
    /// the index out of range, otherwise the slot should exist.
    fn vacant<T>(&self, index: u64, len: u64) -> StrataResult<Option<T>> {
        if index >= len {
            return Ok(None);
        }
        Err(self.missing(index, len))
    }

    fn elements(&self, len: u64) -> ScanRange {
        ScanRange::new(self.slot(0), self.slot(len))
    }

    fn index_of(&self, raw_key: &[u8]) -> StrataResult<u64> {
        let key = self.ns.logical(raw_key)?;
        match key.parts() {
            [KeyPart::Int(i)] if *i >= 0 => Ok(*i as u64),
            _ => Err(StrataError::corruption(format!(
                "array '{}' holds a row that is not an element index",
                self.ns.name()
            ))),
        }
    }
}

fn value_cursor<V: FromValue + 'static>(rows: Vec<Row>) -> Cursor<V> {
    Cursor::new(rows, None, |(_, raw_value)| Some(V::from_value(raw_value)))
}

fn entry_cursor<V: FromValue + 'static>(slots: Slots, rows: Vec<Row>) -> Cursor<(u64, V)> {
    Cursor::new(rows, None, move |(raw_key, raw_value)| {
        let entry = slots
            .index_of(&raw_key)
            .and_then(|i| Ok((i, V::from_value(raw_value)?)));
        Some(entry)
    })
}

/// Named array over a synchronous engine
pub struct IndexedArray<V> {
    engine: Arc<dyn SortedStore>,
    slots: Slots,
    _values: PhantomData<fn() -> V>,
}

impl<V> Clone for IndexedArray<V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            slots: self.slots.clone(),
            _values: PhantomData,
        }
    }
}

impl<V> std::fmt::Debug for IndexedArray<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedArray")
            .field("name", &self.slots.ns.name())
            .finish()
    }
}

impl<V: CollectionValue + 'static> IndexedArray<V> {
    pub(crate) fn open(engine: Arc<dyn SortedStore>, name: &str) -> StrataResult<Self> {
        Ok(Self {
            engine,
            slots: Slots::new(name)?,
            _values: PhantomData,
        })
    }

    /// Name of the array
    pub fn name(&self) -> &str {
        self.slots.ns.name()
    }

    /// Number of elements
    pub fn length(&self) -> StrataResult<u64> {
        Slots::decode_length(self.engine.get(&self.slots.length_key)?)
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> StrataResult<bool> {
        Ok(self.length()? == 0)
    }

    /// Append `value`; returns the new length
    pub fn push<W>(&self, value: &W) -> StrataResult<u64>
    where
        V: std::borrow::Borrow<W>,
        W: ToValue + ?Sized,
    {
        let value = value.to_value()?;
        let len = self.length()?;
        let new_len = self.slots.grow(len)?;
        self.engine.put(&self.slots.slot(len), &value)?;
        self.engine
            .put(&self.slots.length_key, &new_len.to_value()?)?;
        Ok(new_len)
    }

    /// Remove and return the last element; `None` when empty
    pub fn pop(&self) -> StrataResult<Option<V>> {
        let len = self.length()?;
        if len == 0 {
            return Ok(None);
        }
        let last = len - 1;
        let slot = self.slots.slot(last);
        let raw = self
            .engine
            .get(&slot)?
            .ok_or_else(|| self.slots.missing(last, len))?;
        self.engine.put(&self.slots.length_key, &last.to_value()?)?;
        self.engine.delete(&slot)?;
        V::from_value(raw).map(Some)
    }

    /// Element at `index`; negative indexes count from the end
    ///
    /// # Errors
    ///
    /// Returns `Corruption` if the element is missing although the index
    /// is below the current length.
    pub fn at(&self, index: i64) -> StrataResult<Option<V>> {
        let Some(i) = resolve_index(index, self.length()?) else {
            return Ok(None);
        };
        match self.engine.get(&self.slots.slot(i))? {
            Some(raw) => V::from_value(raw).map(Some),
            None => self.slots.vacant(i, self.length()?),
        }
    }

    /// Overwrite the element at `index`
    ///
    /// Returns `false`, changing nothing, when `index` is out of range.
    pub fn set_at<W>(&self, index: i64, value: &W) -> StrataResult<bool>
    where
        V: std::borrow::Borrow<W>,
        W: ToValue + ?Sized,
    {
        let Some(i) = resolve_index(index, self.length()?) else {
            return Ok(false);
        };
        self.engine.put(&self.slots.slot(i), &value.to_value()?)?;
        Ok(true)
    }

    /// Elements in index order
    pub fn values(&self) -> StrataResult<Cursor<V>> {
        let range = self.slots.elements(self.length()?);
        Ok(value_cursor(self.engine.scan(&range)?))
    }

    /// `(index, element)` pairs in index order
    pub fn entries(&self) -> StrataResult<Cursor<(u64, V)>> {
        let range = self.slots.elements(self.length()?);
        Ok(entry_cursor(self.slots.clone(), self.engine.scan(&range)?))
    }
}

/// Named array over an asynchronous engine
pub struct AsyncIndexedArray<V> {
    engine: Arc<dyn AsyncSortedStore>,
    slots: Slots,
    _values: PhantomData<fn() -> V>,
}

impl<V> Clone for AsyncIndexedArray<V> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            slots: self.slots.clone(),
            _values: PhantomData,
        }
    }
}

impl<V> std::fmt::Debug for AsyncIndexedArray<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncIndexedArray")
            .field("name", &self.slots.ns.name())
            .finish()
    }
}

impl<V: CollectionValue + Send + 'static> AsyncIndexedArray<V> {
    pub(crate) fn open(engine: Arc<dyn AsyncSortedStore>, name: &str) -> StrataResult<Self> {
        Ok(Self {
            engine,
            slots: Slots::new(name)?,
            _values: PhantomData,
        })
    }

    /// Name of the array
    pub fn name(&self) -> &str {
        self.slots.ns.name()
    }

    /// Number of elements
    pub async fn length(&self) -> StrataResult<u64> {
        Slots::decode_length(self.engine.get(&self.slots.length_key).await?)
    }

    /// Whether the array has no elements
    pub async fn is_empty(&self) -> StrataResult<bool> {
        Ok(self.length().await? == 0)
    }

    /// Append `value`; returns the new length
    pub async fn push<W>(&self, value: &W) -> StrataResult<u64>
    where
        V: std::borrow::Borrow<W>,
        W: ToValue + ?Sized,
    {
        let value = value.to_value()?;
        let len = self.length().await?;
        let new_len = self.slots.grow(len)?;
        self.engine.put(&self.slots.slot(len), &value).await?;
        self.engine
            .put(&self.slots.length_key, &new_len.to_value()?)
            .await?;
        Ok(new_len)
    }

    /// Remove and return the last element; `None` when empty
    pub async fn pop(&self) -> StrataResult<Option<V>> {
        let len = self.length().await?;
        if len == 0 {
            return Ok(None);
        }
        let last = len - 1;
        let slot = self.slots.slot(last);
        let raw = self
            .engine
            .get(&slot)
            .await?
            .ok_or_else(|| self.slots.missing(last, len))?;
        self.engine
            .put(&self.slots.length_key, &last.to_value()?)
            .await?;
        self.engine.delete(&slot).await?;
        V::from_value(raw).map(Some)
    }

    /// Element at `index`; negative indexes count from the end
    pub async fn at(&self, index: i64) -> StrataResult<Option<V>> {
        let Some(i) = resolve_index(index, self.length().await?) else {
            return Ok(None);
        };
        match self.engine.get(&self.slots.slot(i)).await? {
            Some(raw) => V::from_value(raw).map(Some),
            None => self.slots.vacant(i, self.length().await?),
        }
    }

    /// Overwrite the element at `index`; `false` when out of range
    pub async fn set_at<W>(&self, index: i64, value: &W) -> StrataResult<bool>
    where
        V: std::borrow::Borrow<W>,
        W: ToValue + ?Sized,
    {
        let value = value.to_value()?;
        let Some(i) = resolve_index(index, self.length().await?) else {
            return Ok(false);
        };
        self.engine.put(&self.slots.slot(i), &value).await?;
        Ok(true)
    }

    /// Elements in index order; the scan runs on first poll
    pub async fn values(&self) -> StrataResult<CursorStream<V>> {
        let range = self.slots.elements(self.length().await?);
        Ok(scan_stream(
            Arc::clone(&self.engine),
            range,
            value_cursor::<V>,
        ))
    }

    /// `(index, element)` pairs in index order
    pub async fn entries(&self) -> StrataResult<CursorStream<(u64, V)>> {
        let range = self.slots.elements(self.length().await?);
        let slots = self.slots.clone();
        Ok(scan_stream(Arc::clone(&self.engine), range, move |rows| {
            entry_cursor(slots.clone(), rows)
        }))
    }
}
