use std::hash::Hash;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Thread-safe associative container used wherever mutable shared state is
/// keyed by cluster name.
///
/// Values are cloned out on access, so callers never hold references into the
/// map. Iteration carries no ordering guarantee and no point-in-time snapshot
/// guarantee: entries stored or deleted concurrently may or may not be
/// visited.
pub struct ConcurrentMap<K, V> {
    inner: DashMap<K, V>,
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn load(
        &self,
        key: &K,
    ) -> Option<V> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    pub fn store(
        &self,
        key: K,
        value: V,
    ) {
        self.inner.insert(key, value);
    }

    /// Returns the value already present for `key`, or stores `value` and
    /// returns it. The flag reports whether an entry was already present.
    pub fn load_or_store(
        &self,
        key: K,
        value: V,
    ) -> (V, bool) {
        match self.inner.entry(key) {
            Entry::Occupied(entry) => (entry.get().clone(), true),
            Entry::Vacant(entry) => {
                let actual = value.clone();
                entry.insert(value);
                (actual, false)
            }
        }
    }

    /// Removes `key`, returning the value it held, if any.
    pub fn delete(
        &self,
        key: &K,
    ) -> Option<V> {
        self.inner.remove(key).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Visits entries until `visit` returns false.
    ///
    /// `visit` runs under a shard read lock: it must not store into or delete
    /// from the same map, or it may deadlock.
    pub fn range<F>(
        &self,
        mut visit: F,
    ) where
        F: FnMut(&K, &V) -> bool,
    {
        for entry in self.inner.iter() {
            if !visit(entry.key(), entry.value()) {
                return;
            }
        }
    }
}

impl<K, V> Default for ConcurrentMap<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
