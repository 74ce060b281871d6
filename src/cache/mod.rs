//! Cache Module
//!
//! Provides an in-memory cache with LRU eviction and lazy TTL expiration.

mod expiry;
mod lru;
mod stats;
mod store;
mod ttl;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use expiry::ExpiryIndex;
pub use lru::LruStore;
pub use stats::CacheStats;
pub use store::{Lookup, TtlCache};
pub use ttl::Ttl;
