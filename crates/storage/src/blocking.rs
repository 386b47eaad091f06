//! Async adapter over synchronous engines
//!
//! [`BlockingAdapter`] exposes any [`SortedStore`] as an
//! [`AsyncSortedStore`] by running each call on tokio's blocking thread
//! pool. The caller's task suspends while the engine does its I/O, which
//! is exactly the contract of an inherently suspending backend.
//!
//! Atomicity is inherited: `put_if_absent` runs as one call of the wrapped
//! engine, so it stays atomic against every other caller of that engine,
//! synchronous or asynchronous.
//!
//! Requires a tokio runtime.

use std::sync::Arc;

use async_trait::async_trait;

use stratakv_core::{AsyncSortedStore, Row, ScanRange, SortedStore, StrataError, StrataResult};

/// Runs a synchronous engine on the blocking pool
#[derive(Debug)]
pub struct BlockingAdapter<S> {
    inner: Arc<S>,
}

impl<S> Clone for BlockingAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: SortedStore + 'static> BlockingAdapter<S> {
    /// Wrap an engine
    pub fn new(inner: S) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Wrap an engine that is already shared
    pub fn from_arc(inner: Arc<S>) -> Self {
        Self { inner }
    }

    /// The wrapped engine
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    async fn run<T, F>(&self, op: F) -> StrataResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> StrataResult<T> + Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || op(&*inner))
            .await
            .map_err(|e| StrataError::storage(format!("blocking engine task failed: {}", e)))?
    }
}

#[async_trait]
impl<S: SortedStore + 'static> AsyncSortedStore for BlockingAdapter<S> {
    async fn get(&self, key: &[u8]) -> StrataResult<Option<Vec<u8>>> {
        let key = key.to_vec();
        self.run(move |s| s.get(&key)).await
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> StrataResult<()> {
        let (key, value) = (key.to_vec(), value.to_vec());
        self.run(move |s| s.put(&key, &value)).await
    }

    async fn put_if_absent(&self, key: &[u8], value: &[u8]) -> StrataResult<bool> {
        let (key, value) = (key.to_vec(), value.to_vec());
        self.run(move |s| s.put_if_absent(&key, &value)).await
    }

    async fn delete(&self, key: &[u8]) -> StrataResult<bool> {
        let key = key.to_vec();
        self.run(move |s| s.delete(&key)).await
    }

    async fn scan(&self, range: &ScanRange) -> StrataResult<Vec<Row>> {
        let range = range.clone();
        self.run(move |s| s.scan(&range)).await
    }

    async fn clear(&self) -> StrataResult<()> {
        self.run(|s| s.clear()).await
    }
}
