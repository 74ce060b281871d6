//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Lookups of absent keys are never errors; they return `None`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Rejected `max_size` or `ttl`. The cache keeps its previous configuration.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The value producer passed to `try_get_or_compute` failed
    #[error("Compute failed: {0}")]
    ComputeFailure(#[source] anyhow::Error),
}

impl CacheError {
    /// Shorthand for building an `InvalidConfig` error.
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        CacheError::InvalidConfig(msg.into())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
