//! lru_ttl - A bounded in-memory cache
//!
//! Combines least-recently-used eviction with optional time-to-live
//! expiration. Expired entries are swept lazily at the start of each call;
//! there is no background task.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;

pub use cache::{CacheStats, Lookup, Ttl, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
