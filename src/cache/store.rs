//! Cache Store Module
//!
//! Main cache engine combining LRU storage with lazy TTL expiration.

use std::convert::Infallible;
use std::hash::Hash;

use tracing::{debug, info, trace};

use crate::cache::{CacheStats, ExpiryIndex, LruStore, Ttl};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Lookup ==
/// Whether `get_or_compute` found the key or had to fill it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Hit,
    Miss,
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit)
    }
}

// == TTL Cache ==
/// Bounded cache with LRU eviction and optional TTL expiration.
///
/// There is no background cleanup. Every public call except [`clear`],
/// [`count`] and the getters first sweeps entries whose last write or fill is
/// older than the TTL.
///
/// Reads through [`fetch`] and [`read`] make a key most recently used but do
/// not extend its TTL. Writes and [`get_or_compute`] (hit or miss) do.
///
/// The cache does no locking. Wrap it in a mutex to share it across threads.
///
/// [`clear`]: TtlCache::clear
/// [`count`]: TtlCache::count
/// [`fetch`]: TtlCache::fetch
/// [`read`]: TtlCache::read
/// [`get_or_compute`]: TtlCache::get_or_compute
#[derive(Debug)]
pub struct TtlCache<K, V, C = SystemClock> {
    /// Authoritative entries in recency order
    store: LruStore<K, V>,
    /// Last touch time of every key in `store`
    expiry: ExpiryIndex<K>,
    ttl: Ttl,
    clock: C,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V> TtlCache<K, V, SystemClock> {
    // == Constructors ==
    /// Creates a cache holding at most `max_size` entries that never expire.
    pub fn new(max_size: usize) -> Result<Self> {
        Self::with_ttl(max_size, Ttl::Disabled)
    }

    /// Creates a cache with both a size bound and a TTL.
    pub fn with_ttl(max_size: usize, ttl: impl Into<Ttl>) -> Result<Self> {
        Self::with_clock(max_size, ttl, SystemClock)
    }

    /// Creates a cache from a validated configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        config.validate()?;
        Self::with_ttl(config.max_size, config.ttl)
    }
}

impl<K: Hash + Eq + Clone, V, C: Clock> TtlCache<K, V, C> {
    /// Creates a cache that reads time from `clock`.
    pub fn with_clock(max_size: usize, ttl: impl Into<Ttl>, clock: C) -> Result<Self> {
        validate_max_size(max_size)?;
        Ok(Self {
            store: LruStore::new(max_size),
            expiry: ExpiryIndex::new(),
            ttl: ttl.into(),
            clock,
            stats: CacheStats::new(),
        })
    }

    // == Get Or Compute ==
    /// Returns the value for `key`, calling `compute` once to fill it on a
    /// miss.
    ///
    /// Hit or miss, the key becomes most recently used and its TTL restarts.
    pub fn get_or_compute<F>(&mut self, key: K, compute: F) -> (&V, Lookup)
    where
        F: FnOnce() -> V,
    {
        match self.fill(key, || Ok::<V, Infallible>(compute())) {
            Ok(found) => found,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`get_or_compute`](Self::get_or_compute).
    ///
    /// If `compute` fails its error comes back as
    /// [`CacheError::ComputeFailure`] and nothing is stored.
    pub fn try_get_or_compute<F, E>(&mut self, key: K, compute: F) -> Result<(&V, Lookup)>
    where
        F: FnOnce() -> std::result::Result<V, E>,
        E: Into<anyhow::Error>,
    {
        self.fill(key, || compute().map_err(|e| CacheError::ComputeFailure(e.into())))
    }

    fn fill<F, E>(&mut self, key: K, compute: F) -> std::result::Result<(&V, Lookup), E>
    where
        F: FnOnce() -> std::result::Result<V, E>,
    {
        self.ttl_evict();

        let (value, hit, evicted) = self.store.try_get_or_compute(key.clone(), compute)?;
        self.expiry.touch(key, self.clock.now());
        forget_evicted(&mut self.expiry, &mut self.stats, evicted);
        self.stats.record_lookup(hit);

        let lookup = if hit { Lookup::Hit } else { Lookup::Miss };
        Ok((value, lookup))
    }

    // == Fetch ==
    /// Looks up `key` without filling on a miss.
    ///
    /// A hit makes the key most recently used; its TTL is not extended.
    pub fn fetch(&mut self, key: &K) -> Option<&V> {
        self.ttl_evict();

        let found = self.store.get(key);
        self.stats.record_lookup(found.is_some());
        found
    }

    /// Looks up `key` without changing recency or TTL.
    pub fn peek(&mut self, key: &K) -> Option<&V> {
        self.ttl_evict();
        self.store.peek(key)
    }

    // == Write ==
    /// Stores `value` under `key`, making it most recently used and restarting
    /// its TTL. May evict the least recently used entry.
    pub fn write(&mut self, key: K, value: V) -> &V {
        self.ttl_evict();

        let (value, evicted) = self.store.push(key.clone(), value);
        self.expiry.touch(key, self.clock.now());
        forget_evicted(&mut self.expiry, &mut self.stats, evicted);
        value
    }

    // == Iteration ==
    /// Iterates live entries, most recently used first.
    pub fn iter(&mut self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.ttl_evict();
        self.store.iter()
    }

    // == Delete ==
    /// Removes `key` from the cache. Absent keys are a no-op.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.ttl_evict();

        self.expiry.remove(key);
        let removed = self.store.remove(key);
        self.debug_check_len();
        removed
    }

    // == Contains ==
    /// Checks whether `key` is live, without touching recency or TTL.
    pub fn contains(&mut self, key: &K) -> bool {
        self.ttl_evict();
        self.store.contains(key)
    }

    // == Clear ==
    /// Drops every entry. Statistics are kept.
    pub fn clear(&mut self) {
        self.store.clear();
        self.expiry.clear();
    }

    // == Expire ==
    /// Runs a TTL sweep and nothing else.
    ///
    /// Returns the number of entries that expired.
    pub fn expire_now(&mut self) -> usize {
        self.ttl_evict()
    }

    // == Count ==
    /// Number of stored entries. Does not sweep, so it may include entries
    /// that are already past their TTL.
    pub fn count(&self) -> usize {
        self.store.len()
    }

    /// Alias for [`count`](Self::count).
    pub fn len(&self) -> usize {
        self.count()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // == Configuration ==
    pub fn max_size(&self) -> usize {
        self.store.max_size()
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Changes the size bound, evicting least recently used entries until the
    /// cache fits.
    ///
    /// Fails with `InvalidConfig` if `max_size` is zero, leaving the cache
    /// unchanged.
    pub fn set_max_size(&mut self, max_size: usize) -> Result<()> {
        validate_max_size(max_size)?;
        self.ttl_evict();

        let evicted = self.store.set_max_size(max_size);
        let dropped = forget_evicted(&mut self.expiry, &mut self.stats, evicted);
        info!("Cache resized to {} entries, evicted {}", max_size, dropped);
        self.debug_check();
        Ok(())
    }

    /// Changes the TTL and sweeps against the new horizon straight away.
    pub fn set_ttl(&mut self, ttl: impl Into<Ttl>) {
        self.ttl = ttl.into();
        let expired = self.ttl_evict();
        info!("Cache TTL set to {}, expired {}", self.ttl, expired);
        self.debug_check();
    }

    /// Changes the TTL from fractional seconds.
    ///
    /// Fails with `InvalidConfig` for negative, NaN, or infinite input,
    /// leaving the cache unchanged.
    pub fn set_ttl_secs(&mut self, secs: f64) -> Result<()> {
        let ttl = Ttl::from_secs_f64(secs)?;
        self.set_ttl(ttl);
        Ok(())
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.store.len());
        stats
    }

    // == Consistency ==
    /// Checks that the expiry index tracks exactly the stored keys and is
    /// sorted by touch time.
    pub fn is_consistent(&self) -> bool {
        self.expiry.len() == self.store.len()
            && self.expiry.keys().all(|key| self.store.contains(key))
            && self.expiry.is_time_ordered()
    }

    /// Full walk of both indices; only run after reconfiguration.
    fn debug_check(&self) {
        debug_assert!(
            self.is_consistent(),
            "expiry index out of sync: {} tracked, {} stored",
            self.expiry.len(),
            self.store.len()
        );
    }

    fn debug_check_len(&self) {
        debug_assert_eq!(
            self.expiry.len(),
            self.store.len(),
            "expiry index out of sync"
        );
    }

    // == TTL Sweep ==
    /// Removes every entry whose last touch is at or beyond the TTL horizon.
    ///
    /// The expiry index is oldest first, so the scan stops at the first fresh
    /// entry.
    fn ttl_evict(&mut self) -> usize {
        self.debug_check_len();
        if !self.ttl.is_enabled() {
            return 0;
        }

        let now = self.clock.now();
        let mut expired = 0;
        while let Some(key) = self.expiry.pop_expired(self.ttl, now) {
            self.store.remove(&key);
            expired += 1;
        }

        if expired > 0 {
            self.stats.record_expirations(expired);
            debug!("TTL sweep: removed {} expired entries", expired);
        }
        expired
    }
}

impl<K: Hash + Eq + Clone, V: Clone, C: Clock> TtlCache<K, V, C> {
    /// Like [`fetch`](Self::fetch), returning an owned copy.
    pub fn read(&mut self, key: &K) -> Option<V> {
        self.fetch(key).cloned()
    }

    // == Snapshots ==
    /// Copies out all live entries, most recently used first.
    pub fn to_vec(&mut self) -> Vec<(K, V)> {
        self.ttl_evict();
        self.store.to_vec()
    }

    /// Copies out all live values, most recently used first.
    pub fn values(&mut self) -> Vec<V> {
        self.ttl_evict();
        self.store.values()
    }
}

// == Helpers ==
fn validate_max_size(max_size: usize) -> Result<()> {
    if max_size < 1 {
        return Err(CacheError::invalid_config(format!(
            "max_size must be at least 1, got {}",
            max_size
        )));
    }
    Ok(())
}

/// Drops capacity-evicted keys from the expiry index.
///
/// Takes the fields rather than the cache so callers can keep borrowing the
/// store.
fn forget_evicted<K, V>(
    expiry: &mut ExpiryIndex<K>,
    stats: &mut CacheStats,
    evicted: impl IntoIterator<Item = (K, V)>,
) -> usize
where
    K: Hash + Eq,
{
    let mut dropped = 0;
    for (key, _) in evicted {
        expiry.remove(&key);
        dropped += 1;
        trace!("Evicted least recently used entry");
    }
    stats.record_evictions(dropped);
    dropped
}
