//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment
//! variables or any serde format.

use std::env;

use serde::{Deserialize, Serialize};

use crate::cache::Ttl;
use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// How long entries live after their last write or fill
    pub ttl: Ttl,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// Missing or unparseable values fall back to the defaults.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_TTL` - Seconds, or `none` to disable expiration (default: none)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_size),
            ttl: env::var("CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.ttl),
        }
    }

    /// Checks the values a cache would reject.
    pub fn validate(&self) -> Result<()> {
        if self.max_size < 1 {
            return Err(CacheError::invalid_config(format!(
                "max_size must be at least 1, got {}",
                self.max_size
            )));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            ttl: Ttl::Disabled,
        }
    }
}
