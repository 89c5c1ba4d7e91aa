//! Bounded least-recently-used map.

use std::hash::Hash;

use indexmap::IndexMap;

/// Map with a fixed capacity that evicts the least recently used entry.
///
/// Recency is the insertion order of the backing [`IndexMap`]: hits move the
/// entry to the back and eviction pops the front.
#[derive(Debug)]
pub(crate) struct LruCache<K, V> {
    entries: IndexMap<K, V>,
    capacity: usize,
}

impl<K: Hash + Eq, V: Clone> LruCache<K, V> {
    /// Create an empty cache. A capacity of zero is raised to one.
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: IndexMap::with_capacity(capacity),
            capacity,
        }
    }

    /// Return a clone of the value for `key`, marking it most recently used.
    pub(crate) fn get(&mut self, key: &K) -> Option<V> {
        let index = self.entries.get_index_of(key)?;
        let last = self.entries.len().saturating_sub(1);
        self.entries.move_index(index, last);
        self.entries.get(key).cloned()
    }

    /// Insert or replace `key`, evicting the oldest entry when full.
    pub(crate) fn insert(&mut self, key: K, value: V) {
        if self.entries.shift_remove(&key).is_none() && self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(key, value);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
