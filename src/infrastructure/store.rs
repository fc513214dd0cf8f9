//! Store implementations for rate limit state.
//!
//! Provides concurrent, sharded in-memory storage keyed by client and
//! operation category.

use crate::application::ports::Store;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

/// Thread-safe sharded store backed by DashMap with an ahash hasher.
///
/// DashMap provides lock-free reads and fine-grained locking for writes,
/// so concurrent requests for different clients never contend on a global
/// lock.
#[derive(Debug)]
pub struct ShardedStore<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, V, ahash::RandomState>,
}

impl<K, V> ShardedStore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new sharded store.
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Insert or update a value.
    pub fn insert(&self, key: K, value: V) {
        self.map.insert(key, value);
    }

    /// Get a reference to a value.
    pub fn get<Q>(&self, key: &Q) -> Option<dashmap::mapref::one::Ref<'_, K, V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key)
    }

    /// Check if a key exists.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Remove a key and return its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<(K, V)>
    where
        K: std::borrow::Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.remove(key)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.map.clear();
    }
}

impl<K, V> Default for ShardedStore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Store<K, V> for ShardedStore<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let entry = self.map.entry(key);
        let mut value_ref = entry.or_insert_with(factory);
        accessor(&mut value_ref)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn clear(&self) {
        self.map.clear()
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        self.map.retain(f);
    }
}

// Implement Store for Arc<ShardedStore> so a shared handle can be passed to
// the limiter by value while callers keep their own.
impl<K, V> Store<K, V> for Arc<ShardedStore<K, V>>
where
    K: Hash + Eq + Clone + Send + Sync + Debug,
    V: Send + Sync + Debug,
{
    fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        (**self).with_entry_mut(key, factory, accessor)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn retain<F>(&self, f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        (**self).retain(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let store = ShardedStore::new();

        store.insert("key1", 100);
        store.insert("key2", 200);

        assert_eq!(*store.get("key1").unwrap(), 100);
        assert_eq!(*store.get("key2").unwrap(), 200);
        assert!(store.get("key3").is_none());

        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_with_entry_mut_creates_and_updates() {
        let store = ShardedStore::new();

        let value = store.with_entry_mut("key", || 0, |v| {
            *v += 1;
            *v
        });
        assert_eq!(value, 1);

        let value = store.with_entry_mut("key", || 0, |v| {
            *v += 1;
            *v
        });
        assert_eq!(value, 2);
    }

    #[test]
    fn test_remove() {
        let store = ShardedStore::new();

        store.insert("key", 100);
        assert!(store.contains_key("key"));

        let removed = store.remove("key");
        assert_eq!(removed, Some(("key", 100)));
        assert!(!store.contains_key("key"));
    }

    #[test]
    fn test_retain() {
        let store = ShardedStore::new();

        store.insert("a", 1);
        store.insert("b", 2);
        store.insert("c", 3);

        Store::retain(&store, |_, v| *v % 2 == 1);
        assert_eq!(store.len(), 2);
        assert!(store.contains_key("a"));
        assert!(!store.contains_key("b"));
    }

    #[test]
    fn test_clear() {
        let store = ShardedStore::new();

        store.insert("key1", 100);
        store.insert("key2", 200);
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let store = Arc::new(ShardedStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store_clone = Arc::clone(&store);
            let handle = thread::spawn(move || {
                for j in 0..100 {
                    store_clone.insert(format!("key_{}_{}", i, j), i * 100 + j);
                }
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 1000);
    }

    #[test]
    fn test_concurrent_with_entry_mut_on_one_key() {
        use std::thread;

        let store = Arc::new(ShardedStore::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let store_clone = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    store_clone.with_entry_mut("counter", || 0u64, |v| *v += 1);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*store.get("counter").unwrap(), 1000);
    }
}
