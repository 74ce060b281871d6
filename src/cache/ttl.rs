//! TTL Module
//!
//! The time-to-live setting shared by the cache and its configuration.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CacheError, Result};

// == Ttl ==
/// How long an entry may live after its last write or fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Entries never expire; only capacity evicts them
    #[default]
    Disabled,
    /// Entries expire once this much time has passed since their last touch
    After(Duration),
}

impl Ttl {
    // == Constructors ==
    /// Builds a TTL from fractional seconds.
    ///
    /// Fails with `InvalidConfig` for negative, NaN, or infinite input.
    /// Values too large for a `Duration` saturate to `Duration::MAX`.
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(CacheError::invalid_config(format!(
                "ttl must be a non-negative number of seconds, got {}",
                secs
            )));
        }
        Ok(Ttl::After(
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX),
        ))
    }

    /// Builds a TTL from whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Ttl::After(Duration::from_secs(secs))
    }

    // == Accessors ==
    /// Returns the duration, or `None` when expiration is disabled.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Ttl::Disabled => None,
            Ttl::After(d) => Some(*d),
        }
    }

    /// Returns true when expiration is turned on.
    pub fn is_enabled(&self) -> bool {
        matches!(self, Ttl::After(_))
    }

    // == Is Expired ==
    /// Checks whether an entry touched at `touched` has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once the full TTL has elapsed,
    /// so a zero TTL expires everything on the next check.
    pub fn is_expired(&self, touched: Instant, now: Instant) -> bool {
        match self {
            Ttl::Disabled => false,
            Ttl::After(ttl) => now.saturating_duration_since(touched) >= *ttl,
        }
    }
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        Ttl::After(d)
    }
}

impl From<Option<Duration>> for Ttl {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Ttl::Disabled, Ttl::After)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Disabled => write!(f, "disabled"),
            Ttl::After(d) => write!(f, "{}s", d.as_secs_f64()),
        }
    }
}

impl FromStr for Ttl {
    type Err = CacheError;

    /// Accepts `none`, `disabled`, or a number of seconds with an optional
    /// trailing `s`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") || s.eq_ignore_ascii_case("disabled") {
            return Ok(Ttl::Disabled);
        }
        let number = s.strip_suffix('s').unwrap_or(s);
        let secs: f64 = number
            .parse()
            .map_err(|_| CacheError::invalid_config(format!("unparseable ttl: {:?}", s)))?;
        Ttl::from_secs_f64(secs)
    }
}

// Serialized as a string so that "none" and "1.5" both round through configs.
impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Ttl::Disabled => serializer.serialize_str("none"),
            Ttl::After(d) => serializer.serialize_str(&d.as_secs_f64().to_string()),
        }
    }
}

// Accepts "none", null, a string of seconds, or a bare number of seconds.
impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(TtlVisitor)
    }
}

struct TtlVisitor;

impl<'de> Visitor<'de> for TtlVisitor {
    type Value = Ttl;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a non-negative number of seconds, or \"none\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Ttl, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Ttl, E> {
        Ok(Ttl::from_secs(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Ttl, E> {
        u64::try_from(v)
            .map(Ttl::from_secs)
            .map_err(|_| E::custom(format!("ttl must be non-negative, got {}", v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Ttl, E> {
        Ttl::from_secs_f64(v).map_err(E::custom)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Ttl, E> {
        Ok(Ttl::Disabled)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Ttl, E> {
        Ok(Ttl::Disabled)
    }
}
