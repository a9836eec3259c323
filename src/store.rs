//! Generic keyed raw-data container
//!
//! Every measurement layer (workspace → project → file → class) stores its
//! children in a [`RawData`] container. Lookups are by key equality only;
//! insertion order carries no meaning. `keys()` and `elements()` hand out
//! snapshot views so readers never hold a reference into live storage while
//! a computation pass mutates it.

use std::collections::HashMap;
use std::hash::Hash;

/// Keyed container for per-construct raw data.
#[derive(Debug)]
pub struct RawData<K, E> {
    entries: HashMap<K, E>,
}

impl<K, E> RawData<K, E>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Return the element for `key`, creating it via `factory` on first use.
    ///
    /// Never overwrites: if an element already exists for `key`, `factory`
    /// is not invoked and the existing element is returned.
    pub fn get_or_create<F>(&mut self, key: K, factory: F) -> &mut E
    where
        F: FnOnce() -> E,
    {
        self.entries.entry(key).or_insert_with(factory)
    }

    pub fn get(&self, key: &K) -> Option<&E> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut E> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<E> {
        self.entries.remove(key)
    }

    pub fn remove_all(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of all keys. Order unspecified.
    pub fn keys(&self) -> Vec<K> {
        self.entries.keys().cloned().collect()
    }

    /// Snapshot view of all elements. Order unspecified.
    pub fn elements(&self) -> Vec<&E> {
        self.entries.values().collect()
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut E> {
        self.entries.values_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, E> Default for RawData<K, E>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
