//! One surface over both access modes
//!
//! Every collection kind gets an `async_trait` view implemented for its
//! blocking and its suspending handle. Behavioural tests are written
//! against these views, so each runs unchanged against a sync and an
//! async store.

use std::sync::Arc;

use async_trait::async_trait;
use futures::TryStreamExt;
use stratakv::{
    AccessMode, AsyncIndexedArray, AsyncMultiMap, AsyncOrderedMap, CollectionKey,
    CollectionValue, IndexedArray, MultiMap, OrderedMap, Range, Store, StoreConfig,
    StrataResult,
};
use tempfile::TempDir;

/// Anything usable as a key in these tests
pub trait TestKey: CollectionKey + Clone + Send + Sync + 'static {}
impl<T: CollectionKey + Clone + Send + Sync + 'static> TestKey for T {}

/// Anything usable as a value in these tests
pub trait TestValue: CollectionValue + Clone + Send + Sync + 'static {}
impl<T: CollectionValue + Clone + Send + Sync + 'static> TestValue for T {}

#[async_trait]
pub trait MapUnderTest<K: TestKey, V: TestValue>: Send + Sync {
    async fn set(&self, key: K, value: V) -> StrataResult<()>;
    async fn get(&self, key: K) -> StrataResult<Option<V>>;
    async fn set_if_not_exists(&self, key: K, value: V) -> StrataResult<bool>;
    async fn delete(&self, key: K) -> StrataResult<bool>;
    async fn has(&self, key: K) -> StrataResult<bool>;
    async fn size(&self) -> StrataResult<usize>;
    async fn keys(&self, range: Range<K>) -> StrataResult<Vec<K>>;
    async fn values(&self, range: Range<K>) -> StrataResult<Vec<V>>;
    async fn entries(&self, range: Range<K>) -> StrataResult<Vec<(K, V)>>;
}

#[async_trait]
impl<K: TestKey, V: TestValue> MapUnderTest<K, V> for OrderedMap<K, V> {
    async fn set(&self, key: K, value: V) -> StrataResult<()> {
        OrderedMap::set(self, &key, &value)
    }
    async fn get(&self, key: K) -> StrataResult<Option<V>> {
        OrderedMap::get(self, &key)
    }
    async fn set_if_not_exists(&self, key: K, value: V) -> StrataResult<bool> {
        OrderedMap::set_if_not_exists(self, &key, &value)
    }
    async fn delete(&self, key: K) -> StrataResult<bool> {
        OrderedMap::delete(self, &key)
    }
    async fn has(&self, key: K) -> StrataResult<bool> {
        OrderedMap::has(self, &key)
    }
    async fn size(&self) -> StrataResult<usize> {
        OrderedMap::size(self)
    }
    async fn keys(&self, range: Range<K>) -> StrataResult<Vec<K>> {
        OrderedMap::keys(self, range)?.try_collect_vec()
    }
    async fn values(&self, range: Range<K>) -> StrataResult<Vec<V>> {
        OrderedMap::values(self, range)?.try_collect_vec()
    }
    async fn entries(&self, range: Range<K>) -> StrataResult<Vec<(K, V)>> {
        OrderedMap::entries(self, range)?.try_collect_vec()
    }
}

#[async_trait]
impl<K: TestKey, V: TestValue> MapUnderTest<K, V> for AsyncOrderedMap<K, V> {
    async fn set(&self, key: K, value: V) -> StrataResult<()> {
        AsyncOrderedMap::set(self, &key, &value).await
    }
    async fn get(&self, key: K) -> StrataResult<Option<V>> {
        AsyncOrderedMap::get(self, &key).await
    }
    async fn set_if_not_exists(&self, key: K, value: V) -> StrataResult<bool> {
        AsyncOrderedMap::set_if_not_exists(self, &key, &value).await
    }
    async fn delete(&self, key: K) -> StrataResult<bool> {
        AsyncOrderedMap::delete(self, &key).await
    }
    async fn has(&self, key: K) -> StrataResult<bool> {
        AsyncOrderedMap::has(self, &key).await
    }
    async fn size(&self) -> StrataResult<usize> {
        AsyncOrderedMap::size(self).await
    }
    async fn keys(&self, range: Range<K>) -> StrataResult<Vec<K>> {
        AsyncOrderedMap::keys(self, range).await?.try_collect().await
    }
    async fn values(&self, range: Range<K>) -> StrataResult<Vec<V>> {
        AsyncOrderedMap::values(self, range).await?.try_collect().await
    }
    async fn entries(&self, range: Range<K>) -> StrataResult<Vec<(K, V)>> {
        AsyncOrderedMap::entries(self, range).await?.try_collect().await
    }
}

#[async_trait]
pub trait MultiMapUnderTest<K: TestKey, V: TestValue>: Send + Sync {
    async fn set(&self, key: K, value: V) -> StrataResult<()>;
    async fn get(&self, key: K) -> StrataResult<Option<V>>;
    async fn get_values(&self, key: K) -> StrataResult<Vec<V>>;
    async fn set_if_not_exists(&self, key: K, value: V) -> StrataResult<bool>;
    async fn delete_value(&self, key: K, value: V) -> StrataResult<bool>;
    async fn delete(&self, key: K) -> StrataResult<usize>;
    async fn has(&self, key: K) -> StrataResult<bool>;
    async fn keys(&self, range: Range<K>) -> StrataResult<Vec<K>>;
    async fn values(&self, range: Range<K>) -> StrataResult<Vec<V>>;
    async fn entries(&self, range: Range<K>) -> StrataResult<Vec<(K, V)>>;
}

#[async_trait]
impl<K: TestKey, V: TestValue> MultiMapUnderTest<K, V> for MultiMap<K, V> {
    async fn set(&self, key: K, value: V) -> StrataResult<()> {
        MultiMap::set(self, &key, &value)
    }
    async fn get(&self, key: K) -> StrataResult<Option<V>> {
        MultiMap::get(self, &key)
    }
    async fn get_values(&self, key: K) -> StrataResult<Vec<V>> {
        MultiMap::get_values(self, &key)
    }
    async fn set_if_not_exists(&self, key: K, value: V) -> StrataResult<bool> {
        MultiMap::set_if_not_exists(self, &key, &value)
    }
    async fn delete_value(&self, key: K, value: V) -> StrataResult<bool> {
        MultiMap::delete_value(self, &key, &value)
    }
    async fn delete(&self, key: K) -> StrataResult<usize> {
        MultiMap::delete(self, &key)
    }
    async fn has(&self, key: K) -> StrataResult<bool> {
        MultiMap::has(self, &key)
    }
    async fn keys(&self, range: Range<K>) -> StrataResult<Vec<K>> {
        MultiMap::keys(self, range)?.try_collect_vec()
    }
    async fn values(&self, range: Range<K>) -> StrataResult<Vec<V>> {
        MultiMap::values(self, range)?.try_collect_vec()
    }
    async fn entries(&self, range: Range<K>) -> StrataResult<Vec<(K, V)>> {
        MultiMap::entries(self, range)?.try_collect_vec()
    }
}

#[async_trait]
impl<K: TestKey, V: TestValue> MultiMapUnderTest<K, V> for AsyncMultiMap<K, V> {
    async fn set(&self, key: K, value: V) -> StrataResult<()> {
        AsyncMultiMap::set(self, &key, &value).await
    }
    async fn get(&self, key: K) -> StrataResult<Option<V>> {
        AsyncMultiMap::get(self, &key).await
    }
    async fn get_values(&self, key: K) -> StrataResult<Vec<V>> {
        AsyncMultiMap::get_values(self, &key).await
    }
    async fn set_if_not_exists(&self, key: K, value: V) -> StrataResult<bool> {
        AsyncMultiMap::set_if_not_exists(self, &key, &value).await
    }
    async fn delete_value(&self, key: K, value: V) -> StrataResult<bool> {
        AsyncMultiMap::delete_value(self, &key, &value).await
    }
    async fn delete(&self, key: K) -> StrataResult<usize> {
        AsyncMultiMap::delete(self, &key).await
    }
    async fn has(&self, key: K) -> StrataResult<bool> {
        AsyncMultiMap::has(self, &key).await
    }
    async fn keys(&self, range: Range<K>) -> StrataResult<Vec<K>> {
        AsyncMultiMap::keys(self, range).await?.try_collect().await
    }
    async fn values(&self, range: Range<K>) -> StrataResult<Vec<V>> {
        AsyncMultiMap::values(self, range).await?.try_collect().await
    }
    async fn entries(&self, range: Range<K>) -> StrataResult<Vec<(K, V)>> {
        AsyncMultiMap::entries(self, range).await?.try_collect().await
    }
}

#[async_trait]
pub trait ArrayUnderTest<V: TestValue>: Send + Sync {
    async fn length(&self) -> StrataResult<u64>;
    async fn is_empty(&self) -> StrataResult<bool>;
    async fn push(&self, value: V) -> StrataResult<u64>;
    async fn pop(&self) -> StrataResult<Option<V>>;
    async fn at(&self, index: i64) -> StrataResult<Option<V>>;
    async fn set_at(&self, index: i64, value: V) -> StrataResult<bool>;
    async fn values(&self) -> StrataResult<Vec<V>>;
    async fn entries(&self) -> StrataResult<Vec<(u64, V)>>;
}

#[async_trait]
impl<V: TestValue> ArrayUnderTest<V> for IndexedArray<V> {
    async fn length(&self) -> StrataResult<u64> {
        IndexedArray::length(self)
    }
    async fn is_empty(&self) -> StrataResult<bool> {
        IndexedArray::is_empty(self)
    }
    async fn push(&self, value: V) -> StrataResult<u64> {
        IndexedArray::push(self, &value)
    }
    async fn pop(&self) -> StrataResult<Option<V>> {
        IndexedArray::pop(self)
    }
    async fn at(&self, index: i64) -> StrataResult<Option<V>> {
        IndexedArray::at(self, index)
    }
    async fn set_at(&self, index: i64, value: V) -> StrataResult<bool> {
        IndexedArray::set_at(self, index, &value)
    }
    async fn values(&self) -> StrataResult<Vec<V>> {
        IndexedArray::values(self)?.try_collect_vec()
    }
    async fn entries(&self) -> StrataResult<Vec<(u64, V)>> {
        IndexedArray::entries(self)?.try_collect_vec()
    }
}

#[async_trait]
impl<V: TestValue> ArrayUnderTest<V> for AsyncIndexedArray<V> {
    async fn length(&self) -> StrataResult<u64> {
        AsyncIndexedArray::length(self).await
    }
    async fn is_empty(&self) -> StrataResult<bool> {
        AsyncIndexedArray::is_empty(self).await
    }
    async fn push(&self, value: V) -> StrataResult<u64> {
        AsyncIndexedArray::push(self, &value).await
    }
    async fn pop(&self) -> StrataResult<Option<V>> {
        AsyncIndexedArray::pop(self).await
    }
    async fn at(&self, index: i64) -> StrataResult<Option<V>> {
        AsyncIndexedArray::at(self, index).await
    }
    async fn set_at(&self, index: i64, value: V) -> StrataResult<bool> {
        AsyncIndexedArray::set_at(self, index, &value).await
    }
    async fn values(&self) -> StrataResult<Vec<V>> {
        AsyncIndexedArray::values(self).await?.try_collect().await
    }
    async fn entries(&self) -> StrataResult<Vec<(u64, V)>> {
        AsyncIndexedArray::entries(self).await?.try_collect().await
    }
}

/// A store under test, in-memory or backed by a temporary directory
pub struct TestStore {
    store: Store,
    dir: Option<Arc<TempDir>>,
}

impl TestStore {
    pub fn ephemeral(mode: AccessMode) -> Self {
        Self {
            store: Store::ephemeral(mode),
            dir: None,
        }
    }

    pub fn durable(mode: AccessMode) -> Self {
        let dir = Arc::new(TempDir::new().expect("Failed to create temp dir"));
        let store = Store::open_with_config(dir.path(), config(mode)).expect("Failed to open store");
        Self {
            store,
            dir: Some(dir),
        }
    }

    /// Close and reopen the same directory
    ///
    /// Every handle opened from this store must have been dropped.
    pub fn reopen(self) -> Self {
        let mode = self.store.mode();
        let dir = self.dir.expect("only durable stores can be reopened");
        drop(self.store);
        let store = Store::open_with_config(dir.path(), config(mode)).expect("Failed to reopen store");
        Self {
            store,
            dir: Some(dir),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn mode(&self) -> AccessMode {
        self.store.mode()
    }

    pub fn map<K: TestKey, V: TestValue>(&self, name: &str) -> StrataResult<Box<dyn MapUnderTest<K, V>>> {
        let handle: Box<dyn MapUnderTest<K, V>> = match &self.store {
            Store::Sync(store) => Box::new(store.open_map::<K, V>(name)?),
            Store::Async(store) => Box::new(store.open_map::<K, V>(name)?),
        };
        Ok(handle)
    }

    pub fn multi_map<K: TestKey, V: TestValue>(
        &self,
        name: &str,
    ) -> StrataResult<Box<dyn MultiMapUnderTest<K, V>>> {
        let handle: Box<dyn MultiMapUnderTest<K, V>> = match &self.store {
            Store::Sync(store) => Box::new(store.open_multi_map::<K, V>(name)?),
            Store::Async(store) => Box::new(store.open_multi_map::<K, V>(name)?),
        };
        Ok(handle)
    }

    pub fn array<V: TestValue>(&self, name: &str) -> StrataResult<Box<dyn ArrayUnderTest<V>>> {
        let handle: Box<dyn ArrayUnderTest<V>> = match &self.store {
            Store::Sync(store) => Box::new(store.open_array::<V>(name)?),
            Store::Async(store) => Box::new(store.open_array::<V>(name)?),
        };
        Ok(handle)
    }

    pub async fn clear(&self) -> StrataResult<()> {
        match &self.store {
            Store::Sync(store) => store.clear(),
            Store::Async(store) => store.clear().await,
        }
    }
}

fn config(mode: AccessMode) -> StoreConfig {
    StoreConfig {
        durability: "always".to_string(),
        ..StoreConfig::with_mode(mode)
    }
}
