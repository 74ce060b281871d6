//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a simple reference model.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{Lookup, Ttl, TtlCache};
use crate::clock::ManualClock;

// == Test Configuration ==
const TEST_MAX_SIZE: usize = 5;

// == Strategies ==
/// Small key space so that operations collide often
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..8
}

#[derive(Debug, Clone)]
enum CacheOp {
    Write { key: u8, value: u32 },
    GetOrCompute { key: u8, value: u32 },
    Fetch { key: u8 },
    Delete { key: u8 },
    Advance { millis: u64 },
    Expire,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Write { key, value }),
        (key_strategy(), any::<u32>())
            .prop_map(|(key, value)| CacheOp::GetOrCompute { key, value }),
        key_strategy().prop_map(|key| CacheOp::Fetch { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
        (0u64..600).prop_map(|millis| CacheOp::Advance { millis }),
        Just(CacheOp::Expire),
    ]
}

fn ttl_strategy() -> impl Strategy<Value = Option<u64>> {
    prop_oneof![Just(None), (0u64..2_000).prop_map(Some)]
}

// == Reference Model ==
/// Straightforward O(n) model: entries kept most recently used first.
struct Model {
    entries: Vec<(u8, u32, u64)>,
    max_size: usize,
    ttl_ms: Option<u64>,
    now_ms: u64,
}

impl Model {
    fn new(max_size: usize, ttl_ms: Option<u64>) -> Self {
        Self {
            entries: Vec::new(),
            max_size,
            ttl_ms,
            now_ms: 0,
        }
    }

    fn sweep(&mut self) {
        if let Some(ttl) = self.ttl_ms {
            let now = self.now_ms;
            self.entries.retain(|&(_, _, touched)| now - touched < ttl);
        }
    }

    fn take(&mut self, key: u8) -> Option<(u8, u32, u64)> {
        let pos = self.entries.iter().position(|&(k, _, _)| k == key)?;
        Some(self.entries.remove(pos))
    }

    fn push(&mut self, key: u8, value: u32) {
        if self.entries.len() >= self.max_size {
            self.entries.pop();
        }
        self.entries.insert(0, (key, value, self.now_ms));
    }

    fn write(&mut self, key: u8, value: u32) {
        self.sweep();
        self.take(key);
        self.push(key, value);
    }

    fn get_or_compute(&mut self, key: u8, value: u32) -> (u32, Lookup) {
        self.sweep();
        match self.take(key) {
            Some((_, existing, _)) => {
                self.entries.insert(0, (key, existing, self.now_ms));
                (existing, Lookup::Hit)
            }
            None => {
                self.push(key, value);
                (value, Lookup::Miss)
            }
        }
    }

    fn fetch(&mut self, key: u8) -> Option<u32> {
        self.sweep();
        let entry = self.take(key)?;
        self.entries.insert(0, entry);
        Some(entry.1)
    }

    fn delete(&mut self, key: u8) -> Option<u32> {
        self.sweep();
        self.take(key).map(|(_, v, _)| v)
    }

    fn snapshot(&mut self) -> Vec<(u8, u32)> {
        self.sweep();
        self.entries.iter().map(|&(k, v, _)| (k, v)).collect()
    }
}

fn ttl_from_millis(ttl_ms: Option<u64>) -> Ttl {
    Ttl::from(ttl_ms.map(Duration::from_millis))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // *For any* sequence of operations, the cache SHALL agree with the
    // reference model on every returned value and on its full contents.
    #[test]
    fn prop_matches_reference_model(
        ttl_ms in ttl_strategy(),
        ops in prop::collection::vec(cache_op_strategy(), 1..80)
    ) {
        let clock = ManualClock::new();
        let mut cache =
            TtlCache::with_clock(TEST_MAX_SIZE, ttl_from_millis(ttl_ms), clock.clone()).unwrap();
        let mut model = Model::new(TEST_MAX_SIZE, ttl_ms);

        for op in ops {
            match op {
                CacheOp::Write { key, value } => {
                    prop_assert_eq!(*cache.write(key, value), value);
                    model.write(key, value);
                }
                CacheOp::GetOrCompute { key, value } => {
                    let (got, lookup) = cache.get_or_compute(key, || value);
                    let got = *got;
                    prop_assert_eq!((got, lookup), model.get_or_compute(key, value));
                }
                CacheOp::Fetch { key } => {
                    prop_assert_eq!(cache.read(&key), model.fetch(key));
                }
                CacheOp::Delete { key } => {
                    prop_assert_eq!(cache.delete(&key), model.delete(key));
                }
                CacheOp::Advance { millis } => {
                    clock.advance(Duration::from_millis(millis));
                    model.now_ms += millis;
                }
                CacheOp::Expire => {
                    cache.expire_now();
                }
            }

            prop_assert!(cache.count() <= TEST_MAX_SIZE, "size {} over bound", cache.count());
            prop_assert!(cache.is_consistent(), "indices diverged after {:?}", op);
            prop_assert_eq!(cache.to_vec(), model.snapshot());
        }
    }

    // *For any* sequence of writes, the number of entries SHALL never exceed
    // max_size, including after the bound is lowered.
    #[test]
    fn prop_capacity_enforcement(
        max_size in 1usize..20,
        shrink_to in 1usize..20,
        keys in prop::collection::vec(any::<u16>(), 1..200)
    ) {
        let mut cache: TtlCache<u16, u16> = TtlCache::new(max_size).unwrap();

        for key in keys {
            cache.write(key, key);
            prop_assert!(cache.count() <= max_size);
        }

        cache.set_max_size(shrink_to).unwrap();
        prop_assert!(cache.count() <= shrink_to);
        prop_assert!(cache.is_consistent());
    }

    // *For any* N distinct keys written into a cache of size N - 1 with no
    // reads in between, exactly the first-written key SHALL be evicted.
    #[test]
    fn prop_lru_evicts_first_written(
        keys in prop::collection::hash_set("[a-z]{1,8}", 2..12)
    ) {
        let keys: Vec<String> = keys.into_iter().collect();
        let mut cache = TtlCache::new(keys.len() - 1).unwrap();

        for key in &keys {
            cache.write(key.clone(), ());
        }

        prop_assert!(!cache.contains(&keys[0]));
        for key in keys.iter().skip(1) {
            prop_assert!(cache.contains(key), "key '{}' should survive", key);
        }
    }

    // *For any* TTL T and write time t0, a sweep at t SHALL remove the entry
    // exactly when t >= t0 + T.
    #[test]
    fn prop_ttl_horizon(
        ttl_ms in 0u64..5_000,
        written_at in 0u64..5_000,
        checked_after in 0u64..10_000
    ) {
        let clock = ManualClock::new();
        let mut cache =
            TtlCache::with_clock(4, Duration::from_millis(ttl_ms), clock.clone()).unwrap();

        clock.advance(Duration::from_millis(written_at));
        cache.write("key", 1);
        clock.advance(Duration::from_millis(checked_after));
        cache.expire_now();

        prop_assert_eq!(cache.contains(&"key"), checked_after < ttl_ms);
    }

    // *For any* key refreshed by get_or_compute, it SHALL become the most
    // recently used entry and survive a sweep just before the refreshed horizon.
    #[test]
    fn prop_get_or_compute_refreshes(
        keys in prop::collection::hash_set(any::<u32>(), 2..10),
        pick in any::<prop::sample::Index>()
    ) {
        let keys: Vec<u32> = keys.into_iter().collect();
        let refreshed = keys[pick.index(keys.len())];

        let clock = ManualClock::new();
        let mut cache =
            TtlCache::with_clock(keys.len(), Duration::from_secs(10), clock.clone()).unwrap();
        for key in &keys {
            cache.write(*key, *key);
        }

        clock.advance(Duration::from_secs(6));
        let (_, lookup) = cache.get_or_compute(refreshed, || 0);
        prop_assert_eq!(lookup, Lookup::Hit);
        prop_assert_eq!(cache.iter().next().map(|(k, _)| *k), Some(refreshed));

        clock.advance(Duration::from_millis(9_999));
        cache.expire_now();

        let live: HashSet<u32> = cache.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(live, HashSet::from([refreshed]));
    }
}

// == Additional Unit Tests for Edge Cases ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_sweep_boundary() {
        let mut model = Model::new(2, Some(100));
        model.write(1, 1);
        model.now_ms = 100;
        assert!(model.snapshot().is_empty());
    }

    #[test]
    fn test_delete_twice_is_noop() {
        let mut cache: TtlCache<&str, i32> = TtlCache::new(2).unwrap();
        assert_eq!(cache.delete(&"absent"), None);
        assert_eq!(cache.delete(&"absent"), None);
        assert!(cache.is_consistent());
    }
}
