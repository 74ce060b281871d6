//! Expiry Index Module
//!
//! Tracks when each cached key was last written or filled, oldest first.

use std::hash::Hash;
use std::time::Instant;

use hashlink::LinkedHashMap;

use crate::cache::Ttl;

// == Expiry Index ==
/// Touch times per key, kept in ascending time order.
///
/// Every touch removes the key and re-appends it at the back, and expiry only
/// ever pops from the front, so the order stays sorted without comparisons as
/// long as the touch instants come from a monotonic clock.
#[derive(Debug)]
pub struct ExpiryIndex<K> {
    touched: LinkedHashMap<K, Instant>,
}

impl<K: Hash + Eq> ExpiryIndex<K> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            touched: LinkedHashMap::new(),
        }
    }

    // == Touch ==
    /// Records `key` as touched at `now`, moving it to the newest position.
    pub fn touch(&mut self, key: K, now: Instant) {
        self.touched.remove(&key);
        self.touched.insert(key, now);
    }

    // == Remove ==
    /// Forgets `key`. Returns its last touch time if it was tracked.
    pub fn remove(&mut self, key: &K) -> Option<Instant> {
        self.touched.remove(key)
    }

    // == Oldest ==
    /// Returns the key with the earliest touch time.
    pub fn oldest(&self) -> Option<(&K, &Instant)> {
        self.touched.front()
    }

    // == Pop Expired ==
    /// Removes and returns the oldest key if it has expired under `ttl`.
    ///
    /// Call repeatedly to drain every expired key; stops at the first fresh
    /// one.
    pub fn pop_expired(&mut self, ttl: Ttl, now: Instant) -> Option<K> {
        let (_, touched) = self.touched.front()?;
        if !ttl.is_expired(*touched, now) {
            return None;
        }
        self.touched.pop_front().map(|(key, _)| key)
    }

    // == Lookup ==
    /// Returns when `key` was last touched.
    pub fn touched_at(&self, key: &K) -> Option<Instant> {
        self.touched.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.touched.contains_key(key)
    }

    /// Iterates keys, oldest touch first.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.touched.keys()
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.touched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.touched.clear();
    }

    // == Ordering Check ==
    /// Returns true if touch times never decrease from front to back.
    pub fn is_time_ordered(&self) -> bool {
        let mut times = self.touched.values();
        let Some(mut previous) = times.next() else {
            return true;
        };
        for time in times {
            if time < previous {
                return false;
            }
            previous = time;
        }
        true
    }
}

impl<K: Hash + Eq> Default for ExpiryIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}
