//! LRU Store Module
//!
//! Capacity-bounded key-value storage ordered by recency of use.

use std::hash::Hash;

use hashlink::linked_hash_map::Entry;
use hashlink::LinkedHashMap;

// == LRU Store ==
/// Key-value store that keeps at most `max_size` entries and drops the least
/// recently used one when an insert would overflow.
///
/// Entries live in a `LinkedHashMap` where:
/// - Front = Least recently used
/// - Back = Most recently used
///
/// Iteration and snapshots run most recent first.
#[derive(Debug)]
pub struct LruStore<K, V> {
    entries: LinkedHashMap<K, V>,
    max_size: usize,
}

impl<K: Hash + Eq, V> LruStore<K, V> {
    // == Constructor ==
    /// Creates an empty store. A `max_size` of zero is treated as one.
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: LinkedHashMap::new(),
            max_size: max_size.max(1),
        }
    }

    // == Capacity ==
    /// Returns the maximum number of entries.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Changes the bound, evicting least recently used entries until the
    /// store fits.
    ///
    /// Returns the evicted entries, oldest first.
    pub fn set_max_size(&mut self, max_size: usize) -> Vec<(K, V)> {
        self.max_size = max_size.max(1);
        let mut evicted = Vec::new();
        while self.entries.len() > self.max_size {
            match self.entries.pop_front() {
                Some(entry) => evicted.push(entry),
                None => break,
            }
        }
        evicted
    }

    // == Get Or Compute ==
    /// Returns the value for `key`, computing and inserting it on a miss.
    ///
    /// Returns the value, whether it was a hit, and the entry evicted to make
    /// room (misses only).
    pub fn get_or_compute<F>(&mut self, key: K, compute: F) -> (&V, bool, Option<(K, V)>)
    where
        F: FnOnce() -> V,
    {
        match self.try_get_or_compute(key, || Ok::<V, std::convert::Infallible>(compute())) {
            Ok(found) => found,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`get_or_compute`](Self::get_or_compute).
    ///
    /// If `compute` fails the store is left untouched.
    pub fn try_get_or_compute<F, E>(
        &mut self,
        key: K,
        compute: F,
    ) -> Result<(&V, bool, Option<(K, V)>), E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some((key, value)) = self.entries.remove_entry(&key) {
            return Ok((self.push_newest(key, value), true, None));
        }

        let value = compute()?;
        let evicted = self.make_room();
        Ok((self.push_newest(key, value), false, evicted))
    }

    // == Get ==
    /// Looks up `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let (key, value) = self.entries.remove_entry(key)?;
        Some(self.push_newest(key, value))
    }

    /// Looks up `key` without changing its position.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    // == Insert ==
    /// Stores `value` under `key` as the most recently used entry.
    ///
    /// Returns the least recently used entry if it had to be dropped.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        self.push(key, value).1
    }

    /// Like [`insert`](Self::insert), also returning the stored value.
    pub fn push(&mut self, key: K, value: V) -> (&V, Option<(K, V)>) {
        // Overwrites never evict
        let evicted = match self.entries.remove(&key) {
            Some(_) => None,
            None => self.make_room(),
        };
        (self.push_newest(key, value), evicted)
    }

    // == Remove ==
    /// Removes `key`, returning its value if it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    // == Contains ==
    /// Checks membership without touching recency order.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    // == Oldest ==
    /// Returns the least recently used entry without removing it.
    pub fn oldest(&self) -> Option<(&K, &V)> {
        self.entries.front()
    }

    // == Iteration ==
    /// Iterates entries, most recently used first.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.entries.iter().rev()
    }

    /// Iterates keys, most recently used first.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys().rev()
    }

    // == Length ==
    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops the least recently used entry if one more would overflow.
    /// Callers must know `key` is absent.
    fn make_room(&mut self) -> Option<(K, V)> {
        if self.entries.len() >= self.max_size {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Appends at the most recent end. `key` must not be present.
    fn push_newest(&mut self, key: K, value: V) -> &V {
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                *occupied.get_mut() = value;
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(value),
        }
    }
}

impl<K: Hash + Eq + Clone, V: Clone> LruStore<K, V> {
    // == Snapshots ==
    /// Copies out all entries, most recently used first.
    pub fn to_vec(&self) -> Vec<(K, V)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Copies out all values, most recently used first.
    pub fn values(&self) -> Vec<V> {
        self.entries.values().rev().cloned().collect()
    }
}
