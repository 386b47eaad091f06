//! Lazy iteration over scanned rows
//!
//! A scan returns a snapshot of raw rows; a [`Cursor`] decodes them one at
//! a time as the caller pulls. Dropping a cursor early is always safe: it
//! holds no engine locks and iteration never writes.
//!
//! Asynchronous handles wrap the same cursor in a stream whose first poll
//! performs the scan.

use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;

use stratakv_core::{AsyncSortedStore, Row, ScanRange, StrataResult};

type Decoder<T> = Box<dyn FnMut(Row) -> Option<StrataResult<T>> + Send>;

/// Lazily decoded, finite sequence of collection items
///
/// Each item is a `StrataResult`, since a stored row may fail to decode
/// into the handle's key or value type.
pub struct Cursor<T> {
    rows: std::vec::IntoIter<Row>,
    decode: Decoder<T>,
    remaining: Option<usize>,
}

impl<T> Cursor<T> {
    /// Cursor over `rows`
    ///
    /// `decode` returns `None` to skip a row (used to collapse repeated
    /// keys); `limit` counts produced items, not rows.
    pub(crate) fn new(
        rows: Vec<Row>,
        limit: Option<usize>,
        decode: impl FnMut(Row) -> Option<StrataResult<T>> + Send + 'static,
    ) -> Self {
        Self {
            rows: rows.into_iter(),
            decode: Box::new(decode),
            remaining: limit,
        }
    }

    /// Collect every item, stopping at the first error
    pub fn try_collect_vec(self) -> StrataResult<Vec<T>> {
        self.collect()
    }
}

impl<T> Iterator for Cursor<T> {
    type Item = StrataResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            let row = self.rows.next()?;
            if let Some(item) = (self.decode)(row) {
                if let Some(n) = self.remaining.as_mut() {
                    *n -= 1;
                }
                return Some(item);
            }
        }
    }
}

impl<T> std::fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("rows_left", &self.rows.len())
            .field("remaining", &self.remaining)
            .finish()
    }
}

/// Asynchronous counterpart of [`Cursor`]
pub type CursorStream<T> = BoxStream<'static, StrataResult<T>>;

/// Stream that scans `range` on first poll and then yields decoded items
pub(crate) fn scan_stream<T, F>(
    engine: Arc<dyn AsyncSortedStore>,
    range: ScanRange,
    make_cursor: F,
) -> CursorStream<T>
where
    T: Send + 'static,
    F: Fn(Vec<Row>) -> Cursor<T> + Send + 'static,
{
    stream::once(async move { engine.scan(&range).await })
        .flat_map(move |scanned| match scanned {
            Ok(rows) => stream::iter(make_cursor(rows)).left_stream(),
            Err(e) => stream::iter(std::iter::once(Err(e))).right_stream(),
        })
        .boxed()
}
