//! Keyed collection whose members release their resources on the way out.
//!
//! Every removal path (`remove`, `retain`, `clear`, dropping the registry)
//! goes through [`Registry::evict`], so the release hook runs no matter which
//! caller took the entry out.

use rustc_hash::FxHashMap;
use std::hash::Hash;

pub trait Disposable {
    /// Frees the owned resource. Must be idempotent.
    fn release(&mut self);
}

pub struct Registry<K, V>
where
    K: Eq + Hash + Clone,
    V: Disposable,
{
    entries: FxHashMap<K, V>,
}

impl<K, V> Registry<K, V>
where
    K: Eq + Hash + Clone,
    V: Disposable,
{
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.values()
    }

    /// Inserts `value`. An entry already stored under `key` is evicted first.
    pub fn insert(&mut self, key: K, value: V) {
        self.evict(&key);
        self.entries.insert(key, value);
    }

    /// Removes and releases the entry. Returns whether one was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.evict(key).is_some()
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) {
        let doomed: Vec<K> = self
            .entries
            .iter()
            .filter(|&(k, v)| !keep(k, v))
            .map(|(k, _)| k.clone())
            .collect();
        for key in doomed {
            self.evict(&key);
        }
    }

    pub fn clear(&mut self) {
        let keys: Vec<K> = self.entries.keys().cloned().collect();
        for key in keys {
            self.evict(&key);
        }
    }

    fn evict(&mut self, key: &K) -> Option<V> {
        let mut value = self.entries.remove(key)?;
        value.release();
        Some(value)
    }
}

impl<K, V> Default for Registry<K, V>
where
    K: Eq + Hash + Clone,
    V: Disposable,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for Registry<K, V>
where
    K: Eq + Hash + Clone,
    V: Disposable,
{
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/registry.rs"]
mod tests;
